// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Terminal rendering of a report.

use clash_core::{ClashDetectionReport, ClashMode};
use comfy_table::Table;

/// One row per clash: ids, the measured length and the fingerprint.
pub fn table(mode: ClashMode, report: &ClashDetectionReport) -> Table {
    let measure = match mode {
        ClashMode::Clearance => "distance (mm)",
        ClashMode::Hard => "depth (mm)",
    };
    let mut table = Table::new();
    table.set_header(vec!["idA", "idB", measure, "fingerprint"]);
    for clash in &report.clashes {
        let [p, q] = clash.positions;
        table.add_row(vec![
            clash.id_a.to_string(),
            clash.id_b.to_string(),
            format!("{:.3}", (q - p).norm()),
            format!("{:016x}", clash.fingerprint),
        ]);
    }
    table
}
