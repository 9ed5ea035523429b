//! Static SWIFT/BIC directory
//!
//! Lookups never fail: an unknown code or bank is `None`, which drives the
//! automatic rejection of transfers rather than an error.

use serde::Serialize;

/// One bank in the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwiftEntry {
    pub swift_code: &'static str,
    pub bank_name: &'static str,
}

const ENTRIES: &[SwiftEntry] = &[
    SwiftEntry { swift_code: "ABSAZAJJXXX", bank_name: "Absa Bank Limited" },
    SwiftEntry { swift_code: "AFRCZAJJXXX", bank_name: "African Bank Limited" },
    SwiftEntry { swift_code: "BIDBZAJJXXX", bank_name: "Bidvest Bank Limited" },
    SwiftEntry { swift_code: "CABLZAJJXXX", bank_name: "Capitec Bank Limited" },
    SwiftEntry { swift_code: "DISCZAJJXXX", bank_name: "Discovery Bank Limited" },
    SwiftEntry { swift_code: "FIRNZAJJXXX", bank_name: "First National Bank" },
    SwiftEntry { swift_code: "FINBZAJJXXX", bank_name: "Finbond Bank Limited" },
    SwiftEntry { swift_code: "GRIDZAJJXXX", bank_name: "Grindrod Bank Limited" },
    SwiftEntry { swift_code: "IVESZAJJXXX", bank_name: "Investec Bank Limited" },
    SwiftEntry { swift_code: "LISAZAJJXXX", bank_name: "Mercantile Bank Limited" },
    SwiftEntry { swift_code: "NEDSZAJJXXX", bank_name: "Nedbank Limited" },
    SwiftEntry { swift_code: "SBZAZAJJXXX", bank_name: "Standard Bank of South Africa" },
];

/// Bank identifier lookup, case-insensitive in both directions
#[derive(Debug, Clone, Copy, Default)]
pub struct SwiftDirectory;

impl SwiftDirectory {
    pub fn new() -> Self {
        Self
    }

    /// Canonical bank name for a SWIFT code
    pub fn lookup_by_swift(&self, code: &str) -> Option<&'static str> {
        let code = code.trim();
        ENTRIES
            .iter()
            .find(|e| e.swift_code.eq_ignore_ascii_case(code))
            .map(|e| e.bank_name)
    }

    /// SWIFT code for a bank name
    pub fn lookup_by_name(&self, name: &str) -> Option<&'static str> {
        let name = name.trim();
        ENTRIES
            .iter()
            .find(|e| e.bank_name.eq_ignore_ascii_case(name))
            .map(|e| e.swift_code)
    }

    /// Whether `bank_name` and `swift_code` name the same directory entry
    pub fn matches(&self, bank_name: &str, swift_code: &str) -> bool {
        self.lookup_by_name(bank_name)
            .is_some_and(|code| code.eq_ignore_ascii_case(swift_code.trim()))
    }

    /// 8 or 11 ASCII alphanumerics
    pub fn is_well_formed(code: &str) -> bool {
        matches!(code.len(), 8 | 11) && code.bytes().all(|b| b.is_ascii_alphanumeric())
    }

    pub fn entries(&self) -> &'static [SwiftEntry] {
        ENTRIES
    }
}
