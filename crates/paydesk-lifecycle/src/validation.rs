//! Field rules for accounts and transactions
//!
//! Every check runs; callers get the full list of [`FieldViolation`]s with
//! camelCase field names rather than the first failure.

use std::str::FromStr;

use paydesk_types::{CurrencyCode, FieldViolation, TransactionId, MAX_TRANSACTION_AMOUNT};
use rust_decimal::Decimal;

use crate::swift::SwiftDirectory;

/// Decimal places a stored amount can hold
pub const AMOUNT_SCALE: u32 = 4;

pub const MAX_REFERENCE_LENGTH: usize = 35;

/// Collects violations across a whole input
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation of `field` unless `ok`
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.push(field, message);
        }
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    pub fn extend(&mut self, violations: impl IntoIterator<Item = FieldViolation>) {
        self.0.extend(violations);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<FieldViolation> {
        self.0
    }

    /// `Ok(value)` when nothing was recorded
    pub fn finish<T>(self, value: T) -> Result<T, Vec<FieldViolation>> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.0)
        }
    }
}

// =============================================================================
// Single-field rules
// =============================================================================

fn letters_and_spaces(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    (min..=max).contains(&len) && value.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

fn digits(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

/// Letters and spaces, 2 to 50 characters
pub fn is_valid_full_name(value: &str) -> bool {
    letters_and_spaces(value, 2, 50)
}

/// Exactly 13 digits
pub fn is_valid_id_number(value: &str) -> bool {
    digits(value, 13, 13)
}

/// Own accounts are 10 to 12 digits, at registration and when paying
pub fn is_valid_account_number(value: &str) -> bool {
    digits(value, 10, 12)
}

/// Beneficiaries at other banks may carry up to 16 digits
pub fn is_valid_beneficiary_account_number(value: &str) -> bool {
    digits(value, 10, 16)
}

pub fn is_valid_provider(value: &str) -> bool {
    letters_and_spaces(value, 2, 50)
}

pub fn is_valid_bank_name(value: &str) -> bool {
    let len = value.chars().count();
    (2..=100).contains(&len)
        && value
            .chars()
            .all(|c| c.is_ascii_alphabetic() || " &'.-".contains(c))
}

pub fn is_valid_reference(value: &str) -> bool {
    value.chars().count() <= MAX_REFERENCE_LENGTH && value.chars().all(|c| !c.is_control())
}

/// Trimmed and upper-cased, the form SWIFT codes are stored in
pub fn normalize_swift(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}

/// Parse an amount and check it against `(0, MAX_TRANSACTION_AMOUNT]`
pub fn parse_amount(raw: &str) -> Result<Decimal, &'static str> {
    let amount = Decimal::from_str(raw.trim()).map_err(|_| "Amount must be a number")?;

    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than zero");
    }
    if amount > Decimal::from(MAX_TRANSACTION_AMOUNT) {
        return Err("Amount must not exceed 1000000");
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err("Amount must have at most 4 decimal places");
    }

    Ok(amount)
}

/// Rules shared by registration: full name, id number, account number
pub fn account_violations(full_name: &str, id_number: &str, account_number: &str) -> Vec<FieldViolation> {
    let mut violations = Violations::new();
    violations.check(
        is_valid_full_name(full_name.trim()),
        "fullName",
        "Full name must be 2-50 letters and spaces",
    );
    violations.check(
        is_valid_id_number(id_number.trim()),
        "idNumber",
        "ID number must be exactly 13 digits",
    );
    violations.check(
        is_valid_account_number(account_number.trim()),
        "accountNumber",
        "Account number must be 10-12 digits",
    );
    violations.into_vec()
}

// =============================================================================
// Transaction inputs
// =============================================================================

/// Raw payment input as received from a customer
#[derive(Debug, Clone, Default)]
pub struct PaymentFields {
    pub amount: String,
    pub currency: String,
    pub provider: String,
    pub account_number: String,
}

/// Raw transfer input as received from a customer
#[derive(Debug, Clone, Default)]
pub struct TransferFields {
    pub amount: String,
    pub currency: String,
    pub beneficiary_name: String,
    pub beneficiary_account_number: String,
    pub bank_name: String,
    pub swift_code: String,
    pub reference: Option<String>,
    pub linked_payment_id: Option<String>,
}

/// Payment input that passed every rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPayment {
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub provider: String,
}

/// Transfer input that passed every rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTransfer {
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub beneficiary_name: String,
    pub beneficiary_account_number: String,
    pub bank_name: String,
    pub swift_code: String,
    pub reference: Option<String>,
    pub linked_payment_id: Option<TransactionId>,
}

fn check_amount(violations: &mut Violations, raw: &str) -> Option<Decimal> {
    match parse_amount(raw) {
        Ok(amount) => Some(amount),
        Err(message) => {
            violations.push("amount", message);
            None
        }
    }
}

fn check_currency(violations: &mut Violations, raw: &str) -> Option<CurrencyCode> {
    match CurrencyCode::parse(raw.trim()) {
        Ok(code) => Some(code),
        Err(_) => {
            violations.push("currency", "Currency must be 3 uppercase letters");
            None
        }
    }
}

/// Check a payment against the rules; `own_account_number` is the payer's
pub fn validate_payment(
    fields: &PaymentFields,
    own_account_number: &str,
) -> Result<ValidPayment, Vec<FieldViolation>> {
    let mut violations = Violations::new();

    let amount = check_amount(&mut violations, &fields.amount);
    let currency = check_currency(&mut violations, &fields.currency);

    let provider = fields.provider.trim();
    violations.check(
        is_valid_provider(provider),
        "provider",
        "Provider must be 2-50 letters and spaces",
    );

    let account_number = fields.account_number.trim();
    if !is_valid_account_number(account_number) {
        violations.push("accountNumber", "Account number must be 10-12 digits");
    } else if account_number != own_account_number {
        violations.push("accountNumber", "Account number must be your own account");
    }

    match (amount, currency) {
        (Some(amount), Some(currency)) => violations.finish(ValidPayment {
            amount,
            currency,
            provider: provider.to_string(),
        }),
        _ => Err(violations.into_vec()),
    }
}

/// Check a transfer against the rules; bank and code consistency is not a rule
pub fn validate_transfer(fields: &TransferFields) -> Result<ValidTransfer, Vec<FieldViolation>> {
    let mut violations = Violations::new();

    let amount = check_amount(&mut violations, &fields.amount);
    let currency = check_currency(&mut violations, &fields.currency);

    let beneficiary_name = fields.beneficiary_name.trim();
    violations.check(
        letters_and_spaces(beneficiary_name, 2, 50),
        "beneficiaryName",
        "Beneficiary name must be 2-50 letters and spaces",
    );

    let beneficiary_account_number = fields.beneficiary_account_number.trim();
    violations.check(
        is_valid_beneficiary_account_number(beneficiary_account_number),
        "beneficiaryAccountNumber",
        "Beneficiary account number must be 10-16 digits",
    );

    let bank_name = fields.bank_name.trim();
    violations.check(
        is_valid_bank_name(bank_name),
        "bankName",
        "Bank name must be 2-100 letters, spaces or &'.-",
    );

    let swift_code = normalize_swift(&fields.swift_code);
    violations.check(
        SwiftDirectory::is_well_formed(&swift_code),
        "swiftCode",
        "SWIFT code must be 8 or 11 letters and digits",
    );

    let reference = fields
        .reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    if let Some(reference) = reference {
        violations.check(
            is_valid_reference(reference),
            "reference",
            "Reference must be at most 35 printable characters",
        );
    }

    let linked_payment_id = match fields
        .linked_payment_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        Some(raw) => match TransactionId::parse(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                violations.push("linkedPaymentId", "Linked payment id is not a valid id");
                None
            }
        },
        None => None,
    };

    match (amount, currency) {
        (Some(amount), Some(currency)) => violations.finish(ValidTransfer {
            amount,
            currency,
            beneficiary_name: beneficiary_name.to_string(),
            beneficiary_account_number: beneficiary_account_number.to_string(),
            bank_name: bank_name.to_string(),
            swift_code,
            reference: reference.map(String::from),
            linked_payment_id,
        }),
        _ => Err(violations.into_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payment(amount: &str) -> PaymentFields {
        PaymentFields {
            amount: amount.to_string(),
            currency: "ZAR".to_string(),
            provider: "Western Union".to_string(),
            account_number: "200000000001".to_string(),
        }
    }

    fn transfer() -> TransferFields {
        TransferFields {
            amount: "250.00".to_string(),
            currency: "USD".to_string(),
            beneficiary_name: "Sipho Nkosi".to_string(),
            beneficiary_account_number: "1234567890".to_string(),
            bank_name: "Nedbank Limited".to_string(),
            swift_code: " nedszajjxxx ".to_string(),
            reference: Some("Invoice 42".to_string()),
            linked_payment_id: None,
        }
    }

    fn fields(violations: &[FieldViolation]) -> Vec<&str> {
        violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn test_amount_bounds() {
        assert_eq!(parse_amount("500.25"), Ok(dec!(500.25)));
        assert_eq!(parse_amount("1000000"), Ok(dec!(1000000)));
        assert_eq!(parse_amount(" 0.01 "), Ok(dec!(0.01)));

        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("2000000").is_err());
        assert!(parse_amount("1000000.01").is_err());
        assert!(parse_amount("12.34567").is_err());
        assert!(parse_amount("ten").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_scale() {
        assert_eq!(parse_amount("10.500000"), Ok(dec!(10.5)));
    }

    #[test]
    fn test_valid_payment() {
        let valid = validate_payment(&payment("500.25"), "200000000001").unwrap();
        assert_eq!(valid.amount, dec!(500.25));
        assert_eq!(valid.currency.as_str(), "ZAR");
        assert_eq!(valid.provider, "Western Union");
    }

    #[test]
    fn test_payment_collects_every_violation() {
        let input = PaymentFields {
            amount: "0".to_string(),
            currency: "zar".to_string(),
            provider: "W3stern".to_string(),
            account_number: "123".to_string(),
        };
        let violations = validate_payment(&input, "200000000001").unwrap_err();
        assert_eq!(fields(&violations), vec!["amount", "currency", "provider", "accountNumber"]);
    }

    #[test]
    fn test_payment_must_use_own_account() {
        let violations = validate_payment(&payment("10"), "200000000002").unwrap_err();
        assert_eq!(fields(&violations), vec!["accountNumber"]);
        assert!(violations[0].message.contains("own account"));
    }

    #[test]
    fn test_payment_account_number_length() {
        let mut input = payment("10");
        input.account_number = "2000000000011".to_string();
        let violations = validate_payment(&input, "2000000000011").unwrap_err();
        assert_eq!(fields(&violations), vec!["accountNumber"]);
    }

    #[test]
    fn test_valid_transfer_normalizes_swift() {
        let valid = validate_transfer(&transfer()).unwrap();
        assert_eq!(valid.swift_code, "NEDSZAJJXXX");
        assert_eq!(valid.reference.as_deref(), Some("Invoice 42"));
        assert_eq!(valid.linked_payment_id, None);
    }

    #[test]
    fn test_transfer_collects_every_violation() {
        let input = TransferFields {
            amount: "abc".to_string(),
            currency: "US".to_string(),
            beneficiary_name: "X".to_string(),
            beneficiary_account_number: "12ab".to_string(),
            bank_name: "Bank #1".to_string(),
            swift_code: "NEDS".to_string(),
            reference: Some("r".repeat(36)),
            linked_payment_id: Some("not-a-uuid".to_string()),
        };
        let violations = validate_transfer(&input).unwrap_err();
        assert_eq!(
            fields(&violations),
            vec![
                "amount",
                "currency",
                "beneficiaryName",
                "beneficiaryAccountNumber",
                "bankName",
                "swiftCode",
                "reference",
                "linkedPaymentId",
            ]
        );
    }

    #[test]
    fn test_blank_optionals_are_absent() {
        let mut input = transfer();
        input.reference = Some("   ".to_string());
        input.linked_payment_id = Some("".to_string());
        let valid = validate_transfer(&input).unwrap();
        assert_eq!(valid.reference, None);
        assert_eq!(valid.linked_payment_id, None);
    }

    #[test]
    fn test_unknown_but_well_formed_bank_passes_validation() {
        let mut input = transfer();
        input.bank_name = "Bank of Nowhere".to_string();
        input.swift_code = "NOWHZAJJ".to_string();
        assert!(validate_transfer(&input).is_ok());
    }

    #[test]
    fn test_bank_name_punctuation() {
        assert!(is_valid_bank_name("Standard Bank of South Africa"));
        assert!(is_valid_bank_name("Smith & Sons' Bank-Co."));
        assert!(!is_valid_bank_name("B"));
        assert!(!is_valid_bank_name("Bank 24"));
    }

    #[test]
    fn test_account_rules() {
        assert!(account_violations("Itumeleng Ndlovu", "1234567890125", "200000000001").is_empty());

        let violations = account_violations("I", "12345", "abc");
        assert_eq!(fields(&violations), vec!["fullName", "idNumber", "accountNumber"]);

        assert!(is_valid_account_number("200000000001"));
        assert!(!is_valid_account_number("2000000000011"));
        assert!(is_valid_beneficiary_account_number("1234567890123456"));
        assert!(!is_valid_beneficiary_account_number("12345678901234567"));
    }

    #[test]
    fn test_registrable_accounts_can_pay() {
        for number in ["2000000000", "20000000001", "200000000001", "2000000000011"] {
            let registrable = account_violations("Itumeleng Ndlovu", "1234567890125", number).is_empty();
            let mut input = payment("10");
            input.account_number = number.to_string();
            let payable = validate_payment(&input, number).is_ok();
            assert_eq!(registrable, payable, "{number}");
        }
    }
}
