//! Normalization of documents written by earlier releases or edited by hand.

use tc_calib::ModelKind;
use tc_core::clamp_to;

use crate::schema::RegistryDoc;

/// What `migrate_to_latest` had to repair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Tanks with no `modelo_type`; they are tagged `interp`.
    pub untagged_tanks: usize,
    /// Tanks whose stored `R` disagreed with `D / 2`.
    pub radius_fixes: usize,
    /// Heights pulled back into `[0, D]`.
    pub clamped_heights: usize,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Bring a validated document in line with the current invariants.
pub fn migrate_to_latest(mut doc: RegistryDoc) -> (RegistryDoc, MigrationReport) {
    let mut report = MigrationReport::default();

    for (_, tank) in &mut doc.tanks {
        if tank.model_type.is_none() {
            tank.model_type = Some(ModelKind::Interp);
            report.untagged_tanks += 1;
        }

        let radius = tank.diameter / 2.0;
        if tank.radius != radius {
            tank.radius = radius;
            report.radius_fixes += 1;
        }

        for h in &mut tank.heights {
            let clamped = clamp_to(*h, 0.0, tank.diameter);
            if clamped != *h {
                *h = clamped;
                report.clamped_heights += 1;
            }
        }
    }

    (doc, report)
}
