pub mod catalog;
pub mod pricing;
pub mod reservation;

/// Whether a single-row lookup takes an exclusive row lock (`FOR UPDATE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    None,
    ForUpdate,
}

impl RowLock {
    pub(crate) fn clause(self) -> &'static str {
        match self {
            RowLock::None => "",
            RowLock::ForUpdate => " FOR UPDATE",
        }
    }
}
