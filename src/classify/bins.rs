use std::fmt;

/// Disposal bins the service sorts items into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinKind {
    Yellow,
    Purple,
    Black,
    Other(String),
}

impl BinKind {
    /// Map a `disposal_bin` label such as "Yellow Bin" onto a known bin
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();

        if normalized.contains("yellow") {
            BinKind::Yellow
        } else if normalized.contains("purple") {
            BinKind::Purple
        } else if normalized.contains("black") {
            BinKind::Black
        } else {
            BinKind::Other(label.trim().to_string())
        }
    }

    /// What belongs in the bin
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            BinKind::Yellow => Some("Recyclables (bottles, cans, cardboard)"),
            BinKind::Purple => Some("Coffee and mugs"),
            BinKind::Black => Some("General waste (food scraps, tissues)"),
            BinKind::Other(_) => None,
        }
    }

    pub fn known() -> [BinKind; 3] {
        [BinKind::Yellow, BinKind::Purple, BinKind::Black]
    }
}

impl fmt::Display for BinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinKind::Yellow => write!(f, "Yellow Bin"),
            BinKind::Purple => write!(f, "Purple Bin"),
            BinKind::Black => write!(f, "Black Bin"),
            BinKind::Other(label) => write!(f, "{}", label),
        }
    }
}
