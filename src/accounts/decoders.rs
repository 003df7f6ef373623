use std::str::FromStr;

use rust_decimal::Decimal;
use time::macros::format_description;
use time::Date;

use crate::messages::{Field, Segment};
use crate::Error;

use super::{AccountBalance, AccountInformation, Balance};

// HIUPD:94:6:4+1234567::280:12345678+DE02120300000000202051+KUNDE1+1+EUR+Max Mustermann++Girokonto++HKSAL:1+HKCCS:1'
pub(crate) fn decode_account_information(segment: &Segment) -> Result<AccountInformation, Error> {
    let mut account = AccountInformation {
        number: segment.peek_string(0, 0),
        subaccount: segment.peek_string(0, 1),
        bank_code: segment.peek_string(0, 3),
        iban: segment.peek_string(1, 0),
        customer_id: segment.peek_string(2, 0),
        account_type: segment.peek_string(3, 0),
        currency: segment.peek_string(4, 0),
        owner: segment.peek_string(5, 0),
        product: segment.peek_string(7, 0),
        ..Default::default()
    };

    let second_owner = segment.peek_string(6, 0);
    if !second_owner.is_empty() {
        account.owner = format!("{} {}", account.owner, second_owner).trim().to_owned();
    }

    account.permissions = segment
        .fields
        .iter()
        .skip(9)
        .map(|field| field.get_or_empty(0))
        .filter(|id| id.len() == 5 && id.starts_with("HK"))
        .map(str::to_owned)
        .collect();

    if account.number.is_empty() && account.iban.is_empty() {
        return Err(Error::Parse(0, segment.encode(), "account without number or IBAN".into()));
    }

    Ok(account)
}

// HISAL:5:7:3+DE02120300000000202051:BYLADEM1001:1234567::280:12345678+Girokonto+EUR+C:1523,42:EUR:20240115+C:1400,:EUR:20240115+500,:EUR+2023,42:EUR'
pub(crate) fn decode_balance(segment: &Segment) -> Result<AccountBalance, Error> {
    let Some(booked) = segment.field(3) else {
        return Err(Error::Parse(3, segment.encode(), "missing booked balance".into()));
    };

    Ok(AccountBalance {
        account: segment.peek_string(0, 0),
        product: segment.peek_string(1, 0),
        currency: segment.peek_string(2, 0),
        booked: decode_signed_balance(booked)?,
        pending: match segment.field(4) {
            Some(field) if !field.is_empty() => Some(decode_signed_balance(field)?),
            _ => None,
        },
        credit_line: decode_optional_amount(segment.field(5))?,
        available: decode_optional_amount(segment.field(6))?,
    })
}

// C:1523,42:EUR:20240115
fn decode_signed_balance(field: &Field) -> Result<Balance, Error> {
    let amount = parse_amount(field.get_or_empty(1))?;

    Ok(Balance {
        amount: if field.get_or_empty(0) == "D" { -amount } else { amount },
        currency: field.get_or_empty(2).to_owned(),
        date: parse_date(field.get_or_empty(3))?,
    })
}

fn decode_optional_amount(field: Option<&Field>) -> Result<Option<Decimal>, Error> {
    match field {
        Some(field) if !field.get_or_empty(0).is_empty() => Ok(Some(parse_amount(field.get_or_empty(0))?)),
        _ => Ok(None),
    }
}

/// Parse a FinTS amount with decimal comma, e.g. `1523,42` or `500,`.
pub(crate) fn parse_amount(value: &str) -> Result<Decimal, Error> {
    let normalized = value.trim().replace(',', ".");
    let normalized = normalized.strip_suffix('.').unwrap_or(&normalized);
    Ok(Decimal::from_str(normalized)?)
}

/// Parse a `YYYYMMDD` date.
pub(crate) fn parse_date(value: &str) -> Result<Date, Error> {
    Ok(Date::parse(value, format_description!("[year][month][day]"))?)
}
