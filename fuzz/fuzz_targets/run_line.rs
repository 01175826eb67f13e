#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let mut session = rpncalc::Session::default();
        for line in s.lines() {
            let report = session.run_line(line);
            let _ = report.render(rpncalc::OutputStyle::Full);
        }
    }
});
