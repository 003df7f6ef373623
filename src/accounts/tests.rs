use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use time::macros::date;

use super::*;
use crate::messages::decode;
use crate::testdata::responses;

#[test]
fn test_decode_accounts_from_upd() {
    let segments = decode(responses::INIT_WITH_ACCOUNTS).unwrap();

    let accounts = decode_accounts(&segments);

    assert_eq!(accounts.len(), 2);

    let checking = &accounts[0];
    assert_eq!(checking.number, "1234567");
    assert_eq!(checking.bank_code, "12345678");
    assert_eq!(checking.iban, "DE02120300000000202051");
    assert_eq!(checking.customer_id, "KUNDE1");
    assert_eq!(checking.currency, "EUR");
    assert_eq!(checking.owner, "Max Mustermann");
    assert_eq!(checking.product, "Girokonto");
    assert_eq!(checking.permissions, vec!["HKSAL".to_string(), "HKCCS".to_string(), "HKKAZ".to_string()]);
    assert!(checking.is_permitted("HKCCS"));
    assert!(!checking.is_permitted("HKDSE"));

    assert_eq!(accounts[1].product, "Tagesgeld");
    assert_eq!(accounts[1].to_string(), "DE44500105175407324931 (Tagesgeld)");
}

#[test]
fn test_decode_account_without_identification() {
    let segments = decode("HIUPD:94:6:4+++KUNDE1+1+EUR'").unwrap();

    assert!(decode_account_information(&segments[0]).is_err());
}

#[test]
fn test_decode_accounts_skips_entries_without_identification() {
    let segments = decode("HIUPD:4:6:4+++KUNDE1++EUR+Max Mustermann'HIUPD:5:6:4+7654321::280:12345678+DE44500105175407324931+KUNDE1+1+EUR+Max Mustermann++Tagesgeld'").unwrap();

    let accounts = decode_accounts(&segments);

    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].number, "7654321");
    assert_eq!(accounts[0].product, "Tagesgeld");
}

#[test]
fn test_decode_balance() {
    let segments = decode(responses::BALANCE).unwrap();
    let segment = segments.iter().find(|segment| segment.id == "HISAL").unwrap();

    let balance = decode_balance(segment).unwrap();

    assert_eq!(balance.account, "DE02120300000000202051");
    assert_eq!(balance.product, "Girokonto");
    assert_eq!(balance.currency, "EUR");
    assert_eq!(balance.booked.amount, Decimal::new(152342, 2));
    assert_eq!(balance.booked.date, date!(2024 - 01 - 15));
    assert_eq!(balance.pending.as_ref().map(|pending| pending.amount), Some(Decimal::new(-2500, 2)));
    assert_eq!(balance.credit_line, Some(Decimal::new(500, 0)));
    assert_eq!(balance.available, Some(Decimal::new(202342, 2)));
}

#[test]
fn test_decode_balance_without_optional_fields() {
    let segments = decode("HISAL:5:7:3+1234567::280:12345678+Sparbuch+EUR+D:10,5:EUR:20231231'").unwrap();

    let balance = decode_balance(&segments[0]).unwrap();

    assert_eq!(balance.booked.amount, Decimal::new(-105, 1));
    assert_eq!(balance.pending, None);
    assert_eq!(balance.credit_line, None);
    assert_eq!(balance.available, None);
}

#[test]
fn test_parse_amount() {
    assert_eq!(parse_amount("1523,42").unwrap(), Decimal::new(152342, 2));
    assert_eq!(parse_amount("500,").unwrap(), Decimal::new(500, 0));
    assert!(parse_amount("abc").is_err());
}

#[test]
fn test_parse_date() {
    assert_eq!(parse_date("20240229").unwrap(), date!(2024 - 02 - 29));
    assert!(parse_date("2024-02-29").is_err());
}
