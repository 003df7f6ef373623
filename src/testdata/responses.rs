use crate::messages::escape;

// dialog setup

pub const SYNC: &str = "HNHBK:1:3+000000000240+300+SYNC1+1'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:4+0020::Auftrag ausgeführt.+3920::Zugelassene TAN-Verfahren für den Benutzer:999'HISYN:4:4:5+SYSID123'HNHBS:5:1+1'";

pub const SYNC_REJECTED: &str = "HNHBK:1:3+000000000120+300+SYNC1+1'HIRMG:2:2+9050::Die Nachricht enthält Fehler.'HIRMS:3:2:4+9931::Sperrung des Kontos nach zu vielen Fehlversuchen.'HNHBS:4:1+1'";

pub const INIT: &str = "HNHBK:1:3+000000000200+300+DIALOG1+1'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:4+3920::Zugelassene TAN-Verfahren für den Benutzer:999+0020::Der Auftrag wurde ausgeführt.'HNHBS:4:1+1'";

pub const INIT_TWO_STEP: &str = "HNHBK:1:3+000000000200+300+DIALOG1+1'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:4+3920::Zugelassene TAN-Verfahren für den Benutzer:942:921+0020::Der Auftrag wurde ausgeführt.'HNHBS:4:1+1'";

pub const INIT_REJECTED: &str = "HNHBK:1:3+000000000150+300+DIALOG1+1'HIRMG:2:2+9050::Die Nachricht enthält Fehler.'HIRMS:3:2:3+9942::PIN falsch.'HNHBS:4:1+1'";

pub const INIT_WITH_ACCOUNTS: &str = "HNHBK:1:3+000000000600+300+DIALOG1+1'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:4+3920::Zugelassene TAN-Verfahren für den Benutzer:999+0020::Der Auftrag wurde ausgeführt.'HIPINS:4:1:4+1+1+0+5:20:6:USERID:CUSTID:HKSAL:N:HKCCS:J:HKKAZ:N:HKCDB:J'HISPAS:5:1:4+1+1+1+J:J:N:urn?:iso?:std?:iso?:20022?:tech?:xsd?:pain.001.003.03:urn?:iso?:std?:iso?:20022?:tech?:xsd?:pain.008.003.02'HIUPD:6:6:4+1234567::280:12345678+DE02120300000000202051+KUNDE1+1+EUR+Max Mustermann++Girokonto++HKSAL:1+HKCCS:1+HKKAZ:1'HIUPD:7:6:4+5407324931::280:50010517+DE44500105175407324931+KUNDE1+10+EUR+Max+Mustermann+Tagesgeld++HKSAL:1'HNHBS:8:1+1'";

pub const DIALOG_END: &str = "HNHBK:1:3+000000000110+300+DIALOG1+3'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:3+0100::Dialog beendet.'HNHBS:4:1+3'";

// operations

pub const BALANCE: &str = "HNHBK:1:3+000000000300+300+DIALOG1+2'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:3+0020::Der Auftrag wurde ausgeführt.'HISAL:4:7:3+DE02120300000000202051:BYLADEM1001:1234567::280:12345678+Girokonto+EUR+C:1523,42:EUR:20240115+D:25,:EUR:20240115+500,:EUR+2023,42:EUR'HNHBS:5:1+2'";

pub const OPERATION_REJECTED: &str = "HNHBK:1:3+000000000160+300+DIALOG1+2'HIRMG:2:2+9050::Die Nachricht enthält Fehler.'HIRMS:3:2:3+9210::Empfänger-IBAN ungültig.'HNHBS:4:1+2'";

pub const EXECUTED: &str = "HNHBK:1:3+000000000160+300+DIALOG1+2'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:3+0020::Der Auftrag wurde ausgeführt.'HNHBS:4:1+2'";

// strong customer authentication

pub const SCA_REQUIRED: &str = "HNHBK:1:3+000000000260+300+DIALOG1+2'HIRMG:2:2+3060::Bitte beachten Sie die enthaltenen Warnungen/Hinweise.'HIRMS:3:2:4+0030::Auftrag empfangen - Sicherheitsfreigabe erforderlich.'HITAN:4:6:4+4++ORDERREF1+Bitte geben Sie die TAN ein.'HNHBS:5:1+2'";

pub const TAN_ACCEPTED: &str = "HNHBK:1:3+000000000170+300+DIALOG1+3'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:3+0020::Der Auftrag wurde ausgeführt.'HITAN:4:6:3+2++ORDERREF1'HNHBS:5:1+3'";

pub const TAN_MEDIA: &str = "HNHBK:1:3+000000000200+300+DIALOG1+2'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:3+0020::Der Auftrag wurde ausgeführt.'HITAB:4:4:3+0+A:1:::::::::::Mein Handy::::::::+A:2:::::::::::0170 1234567::::::::'HNHBS:5:1+2'";

/// A statement page with MT940 booked and optional MT942 pending data, continued when `cursor` is set.
pub fn statement_page(booked: &str, pending: Option<&str>, cursor: Option<&str>) -> String {
    let mut data = format!("HIKAZ:4:7:3+@{}@{}", booked.len(), booked);
    if let Some(pending) = pending {
        data.push_str(&format!("+@{}@{}", pending.len(), pending));
    }
    data.push('\'');

    page(&data, cursor)
}

/// A camt page carrying the given documents, continued when `cursor` is set.
pub fn camt_page(documents: &[&str], cursor: Option<&str>) -> String {
    let documents: Vec<String> = documents.iter().map(|document| format!("@{}@{}", document.len(), document)).collect();
    let data = format!(
        "HICAZ:4:1:3+DE02120300000000202051:BYLADEM1001:1234567::280:12345678+urn?:iso?:std?:iso?:20022?:tech?:xsd?:camt.052.001.02+{}'",
        documents.join(":")
    );

    page(&data, cursor)
}

/// Standing order listing with one entry per `(order id, document)`.
pub fn standing_orders(orders: &[(&str, &str)]) -> String {
    let data: String = orders
        .iter()
        .map(|(order_id, document)| {
            format!(
                "HICDB:4:1:3+DE02120300000000202051:BYLADEM1001+urn?:iso?:std?:iso?:20022?:tech?:xsd?:pain.001.001.03+@{}@{}+{}+20240201:M:1:1'",
                document.len(),
                document,
                order_id
            )
        })
        .collect();

    page(&data, None)
}

fn page(data: &str, cursor: Option<&str>) -> String {
    let status = match cursor {
        Some(cursor) => format!("3040::Es liegen weitere Informationen vor.:{}", escape(cursor)),
        None => String::from("0020::Der Auftrag wurde ausgeführt."),
    };

    format!("HNHBK:1:3+000000000400+300+DIALOG1+2'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:3+{status}'{data}HNHBS:5:1+2'")
}
