/// UI module
///
/// Widget composition for the two screens:
/// - the browse grid with its filter bar (browse.rs)
/// - the single-object detail pane with the contribution editor (detail.rs)

pub mod browse;
pub mod detail;

/// A dropdown value that can also mean "no constraint". Keeps the
/// query-layer enums free of UI concerns while giving every pick list a
/// selectable "all" row.
#[derive(Debug, Clone, PartialEq)]
pub enum Choice<T> {
    Any(&'static str),
    Is(T),
}

impl<T: Clone> Choice<T> {
    /// The "all" row followed by every concrete option.
    pub fn options(label: &'static str, all: &[T]) -> Vec<Choice<T>> {
        std::iter::once(Choice::Any(label))
            .chain(all.iter().cloned().map(Choice::Is))
            .collect()
    }

    pub fn from_option(label: &'static str, value: Option<T>) -> Choice<T> {
        match value {
            Some(value) => Choice::Is(value),
            None => Choice::Any(label),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Choice::Any(_) => None,
            Choice::Is(value) => Some(value),
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Choice::Any(label) => f.write_str(label),
            Choice::Is(value) => value.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_round_trip() {
        let choice = Choice::from_option("All", Some(3));
        assert_eq!(choice, Choice::Is(3));
        assert_eq!(choice.into_option(), Some(3));

        let any: Choice<i32> = Choice::from_option("All", None);
        assert_eq!(any.to_string(), "All");
        assert_eq!(any.into_option(), None);
    }

    #[test]
    fn test_options_lead_with_the_all_row() {
        let options = Choice::options("All", &[1, 2]);
        assert_eq!(options, vec![Choice::Any("All"), Choice::Is(1), Choice::Is(2)]);
    }
}
