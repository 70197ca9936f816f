use std::collections::HashSet;

pub trait Catalog {
    /// Whether `name` is a base table known to the host.
    fn has_table(&self, name: &str) -> bool;
}

impl Catalog for HashSet<String> {
    fn has_table(&self, name: &str) -> bool {
        self.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_set_catalog_matches_exact_names() {
        let tables: HashSet<String> = ["orders".to_string()].into_iter().collect();
        assert!(tables.has_table("orders"));
        assert!(!tables.has_table("Orders"));
    }
}
