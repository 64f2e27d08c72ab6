#![no_main]

use libfuzzer_sys::fuzz_target;

use adapters::alert::json_decoder::JsonAlertDecoder;
use domain::mitigation::entity::TriggerPolicy;

// Decode arbitrary lines as alerts and push the result through the
// helpers the mitigation engine uses: source parsing, protocol label and
// the default trigger.
//
// Layout:
//   [0]  = selector (even: default field mapping, odd: swapped mapping)
//   rest = the alert line
fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let line = String::from_utf8_lossy(rest);

    let decoder = if selector % 2 == 0 {
        JsonAlertDecoder::default()
    } else {
        let mut mapping = JsonAlertDecoder::default().mapping().clone();
        std::mem::swap(&mut mapping.source_fields, &mut mapping.message_fields);
        JsonAlertDecoder::new(mapping)
    };

    let trigger = TriggerPolicy::default();
    if let Ok(record) = decoder.decode(&line) {
        let _ = record.source_ip();
        let _ = record.source_or_unknown();
        let _ = record.protocol.as_label();
        let _ = trigger.matches(&record.message);
    }
});
