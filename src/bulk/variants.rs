/// One expanded query: the base with a single suffix character appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryVariant {
    pub base_query: String,
    pub suffix: char,
}

impl QueryVariant {
    pub fn text(&self) -> String {
        format!("{}{}", self.base_query, self.suffix)
    }
}

/// Ordered suffix set used to expand a base query into variants.
#[derive(Debug, Clone)]
pub struct Alphabet(Vec<char>);

impl Default for Alphabet {
    fn default() -> Self {
        Alphabet(('a'..='z').chain('0'..='9').collect())
    }
}

impl Alphabet {
    #[cfg(test)]
    pub(crate) fn of(suffixes: &str) -> Self {
        Alphabet(suffixes.chars().collect())
    }

    pub fn expand(&self, base_query: &str) -> Vec<QueryVariant> {
        self.0
            .iter()
            .map(|&suffix| QueryVariant {
                base_query: base_query.to_string(),
                suffix,
            })
            .collect()
    }
}
