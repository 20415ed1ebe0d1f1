use std::fmt;

/// The supervised learning task a tree or forest is trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Task {
    /// Predict a class index in `[0, n_classes)`.
    Classification,
    /// Predict a real value.
    Regression,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Classification => f.write_str("classification"),
            Task::Regression => f.write_str("regression"),
        }
    }
}
