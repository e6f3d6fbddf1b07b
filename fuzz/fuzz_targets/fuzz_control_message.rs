#![no_main]

use dashgrid_web::{ControlMessage, ControlMessageError};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    match ControlMessage::decode(text) {
        Ok(message) => {
            let encoded = message.encode().expect("encode message");
            assert_eq!(ControlMessage::decode(&encoded).ok(), Some(message));
        }
        Err(ControlMessageError::UnknownType(kind)) => {
            assert_ne!(kind, "TOGGLE_DASHBOARD_EDIT");
            assert_ne!(kind, "GET_DASHBOARD_EDIT_STATE");
        }
        Err(ControlMessageError::Malformed(_)) => {}
    }
});
