//! End to end runs of the blocking dialog against a scripted bank.
//!
//! The bank is a closure transport replaying canned responses, so the tests need no
//! network access:
//! ```bash
//! cargo test --test dialog_integration
//! RUST_LOG=debug cargo test --test dialog_integration -- --nocapture
//! ```

#![cfg(all(feature = "sync", not(feature = "async")))]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;

use fints::connection::ConnectionDetails;
use fints::dialog::{Dialog, DialogState};
use fints::messages::decode;
use fints::tan::{tan_channel, TanChallenge, TanResponse};
use fints::transactions::{PainRequest, PainScheme, Party, Payment};
use fints::Error;
use rust_decimal::Decimal;

const SYNC: &str = "HNHBK:1:3+000000000240+300+SYNC1+1'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:4+0020::Auftrag ausgeführt.+3920::Zugelassene TAN-Verfahren für den Benutzer:942'HISYN:4:4:5+SYSTEM42'HNHBS:5:1+1'";
const INIT: &str = "HNHBK:1:3+000000000200+300+D42+1'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:4+3920::Zugelassene TAN-Verfahren für den Benutzer:942+0020::Der Auftrag wurde ausgeführt.'HNHBS:4:1+1'";
const BALANCE: &str = "HNHBK:1:3+000000000300+300+D42+2'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:3+0020::Der Auftrag wurde ausgeführt.'HISAL:4:7:3+DE02120300000000202051:BYLADEM1001:1234567::280:12345678+Girokonto+EUR+C:99,5:EUR:20240301'HNHBS:5:1+2'";
const SCA: &str = "HNHBK:1:3+000000000260+300+D42+2'HIRMG:2:2+3060::Bitte beachten Sie die enthaltenen Warnungen/Hinweise.'HIRMS:3:2:4+0030::Auftrag empfangen - Sicherheitsfreigabe erforderlich.'HITAN:4:6:4+4++REF42+TAN aus der App eingeben'HNHBS:5:1+2'";
const EXECUTED: &str = "HNHBK:1:3+000000000170+300+D42+3'HIRMG:2:2+0010::Nachricht entgegengenommen.'HIRMS:3:2:3+0020::Der Auftrag wurde ausgeführt.'HNHBS:4:1+3'";

/// A bank replaying `responses` in order and keeping every request.
#[derive(Clone, Default)]
struct ScriptedBank {
    requests: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<VecDeque<String>>>,
}

impl ScriptedBank {
    fn new(responses: &[&str]) -> Self {
        ScriptedBank {
            requests: Arc::default(),
            responses: Arc::new(Mutex::new(responses.iter().map(|response| response.to_string()).collect())),
        }
    }

    fn transport(&self) -> impl Fn(&str) -> Result<String, Error> {
        let bank = self.clone();
        move |request: &str| {
            bank.requests.lock().unwrap().push(request.to_owned());
            bank.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::Transport("bank closed the connection".into()))
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn connection() -> ConnectionDetails {
    ConnectionDetails {
        url: "https://fints.example.com/fints".into(),
        bank_code: "12345678".into(),
        bic: "BYLADEM1001".into(),
        user_id: "integration".into(),
        pin: "pin1234".into(),
        account: "1234567".into(),
        iban: "DE02120300000000202051".into(),
        account_holder: "Max Mustermann".into(),
        ..Default::default()
    }
}

fn document(request: &PainRequest, scheme: PainScheme) -> Result<String, Error> {
    Ok(format!("<Document scheme='{scheme}'>{}</Document>", request.total()))
}

#[test]
fn balance_after_synchronization() {
    let _ = env_logger::try_init();

    let bank = ScriptedBank::new(&[SYNC, INIT, BALANCE]);
    let connection = connection();
    let mut dialog = Dialog::new(connection.clone(), bank.transport(), |_: &TanChallenge| TanResponse::Cancelled);

    let result = dialog.balance().unwrap();

    assert!(result.is_success(), "{:?}", result.messages());
    assert_eq!(result.data().unwrap().booked.amount, Decimal::new(995, 1));
    assert_eq!(connection.system_id.get().unwrap().as_deref(), Some("SYSTEM42"));
    assert_eq!(bank.requests().len(), 3);
    assert_eq!(dialog.state(), DialogState::Completed);

    for request in bank.requests() {
        let header = &decode(&request).unwrap()[0];
        assert_eq!(header.get(0, 0).unwrap().parse::<usize>().unwrap(), request.len());
    }
}

#[test]
fn transfer_confirmed_through_tan_channel() {
    let _ = env_logger::try_init();

    let bank = ScriptedBank::new(&[INIT, SCA, EXECUTED]);
    let connection = connection();
    connection.system_id.set("SYSTEM42").unwrap();

    let (provider, challenges) = tan_channel();
    let user = thread::spawn(move || {
        let request = challenges.recv().unwrap();
        let text = request.challenge().challenge().map(String::from);
        request.respond(TanResponse::Tan("778899".into())).unwrap();
        text
    });

    let mut dialog = Dialog::new(connection, bank.transport(), provider);
    let payee = Party::new("Erika Mustermann", "DE44500105175407324931", "INGDDEFFXXX");
    let request = PainRequest::credit_transfer(
        Party::new("Max Mustermann", "DE02120300000000202051", "BYLADEM1001"),
        vec![Payment::new(payee, Decimal::new(4250, 2), "Rechnung 42")],
    );

    let result = dialog.transfer(&request, &document).unwrap();

    assert!(result.is_success());
    assert_eq!(user.join().unwrap().as_deref(), Some("TAN aus der App eingeben"));

    let requests = bank.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[2].contains("REF42"));
    assert!(requests[2].contains("pin1234:778899"));
}

#[test]
fn unreachable_bank() {
    let bank = ScriptedBank::new(&[]);
    let mut dialog = Dialog::new(connection(), bank.transport(), |_: &TanChallenge| TanResponse::Cancelled);

    let error = dialog.balance().unwrap_err();

    assert!(error.is_transport());
    assert_eq!(dialog.state(), DialogState::Failed);
}
