use std::fmt::Display;

/// A normalized aggregate call carried by an aggregate plan node.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct AggregateCall {
    pub func: String,            // normalized lowercase
    pub args: Vec<String>,       // already-bound argument expressions
    pub distinct: bool,
}

impl AggregateCall {
    pub fn new(func: &str, args: Vec<String>, distinct: bool) -> Self {
        Self {
            func: func.to_ascii_lowercase(),
            args,
            distinct,
        }
    }
}

impl Display for AggregateCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        write!(f, "{}({}{})", self.func, distinct, self.args.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lowercases_function_name() {
        let call = AggregateCall::new("SUM", vec!["t.amt".into()], false);
        assert_eq!(call.func, "sum");
        assert_eq!(call, AggregateCall::new("sum", vec!["t.amt".into()], false));
    }

    #[test]
    fn display_marks_distinct() {
        let call = AggregateCall::new("Count", vec!["t.city".into()], true);
        assert_eq!(call.to_string(), "count(DISTINCT t.city)");

        let call = AggregateCall::new("max", vec!["a".into(), "b".into()], false);
        assert_eq!(call.to_string(), "max(a, b)");
    }
}
