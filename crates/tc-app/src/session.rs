//! Session accessor: the verb surface front ends call.
//!
//! A [`Session`] owns one [`TankRegistry`]. Unqualified reads resolve through
//! the registry's current tank, so there is no second copy of the active
//! tank's dimensions or model to drift out of date.

use std::path::Path;

use tc_calib::{FitMetrics, ModelTrainer, evaluate, fill_fraction, volume_gallons};
use tc_core::{ensure_finite, ensure_positive};
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::error::AppResult;
use crate::input::IntoValues;
use crate::registry::TankRegistry;
use crate::tank::{Dataset, TankInfo, TankSummary};

#[derive(Debug, Clone)]
pub struct Session {
    registry: TankRegistry,
    config: SessionConfig,
}

impl Session {
    /// Build the default registry, then load the configured store if present.
    ///
    /// A missing or unreadable store is not an error: the session starts from
    /// the default tank and the failure is logged. With autosave on, an
    /// unreadable store is first moved to `<path>.bak`; if that fails autosave
    /// stays off.
    pub fn open(config: SessionConfig) -> AppResult<Self> {
        config.validate()?;
        let trainer = ModelTrainer::new(config.trainer.clone());
        let mut registry = TankRegistry::new(trainer, config.analytic_samples)?;
        if let Some(path) = &config.store_path {
            let usable = match registry.try_load(path) {
                Ok(_) => true,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to load tank registry; starting from defaults");
                    !config.autosave || preserve_unreadable(path)
                }
            };
            if config.autosave && usable {
                registry.set_autosave(Some(path.clone()));
            }
        }
        info!(
            tanks = registry.tank_count(),
            current = %registry.current_id(),
            kind = %registry.trainer().selected_kind(),
            "session opened"
        );
        Ok(Self { registry, config })
    }

    /// Session with no backing store.
    pub fn in_memory() -> AppResult<Self> {
        Self::open(SessionConfig::in_memory())
    }

    pub fn registry(&self) -> &TankRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Analytic volume in gallons. Missing dimensions come from the current tank.
    pub fn compute_volume(
        &self,
        height: f64,
        diameter: Option<f64>,
        length: Option<f64>,
    ) -> AppResult<f64> {
        let height = ensure_finite(height, "height")?;
        let tank = self.registry.current();
        let diameter = ensure_positive(diameter.unwrap_or(tank.diameter()), "diameter")?;
        let length = ensure_positive(length.unwrap_or(tank.length()), "length")?;
        Ok(volume_gallons(height, diameter, length))
    }

    /// Calibrated volume from the named tank's model, or the current tank's.
    pub fn predict_volume(&self, height: f64, tank_id: Option<&str>) -> AppResult<f64> {
        let height = ensure_finite(height, "height")?;
        Ok(self.registry.resolve(tank_id)?.predict(height))
    }

    /// Dipstick gauge: `height` as a percentage of the current tank's diameter.
    pub fn fill_percent(&self, height: f64) -> AppResult<f64> {
        let height = ensure_finite(height, "height")?;
        Ok(fill_fraction(height, self.registry.current().diameter()) * 100.0)
    }

    pub fn create_tank(&mut self, name: &str, diameter: f64, length: f64) -> AppResult<String> {
        self.registry.create(name, diameter, length, None)
    }

    pub fn create_tank_with_id(
        &mut self,
        id: &str,
        name: &str,
        diameter: f64,
        length: f64,
    ) -> AppResult<String> {
        self.registry.create(name, diameter, length, Some(id))
    }

    pub fn list_tanks(&self) -> Vec<TankSummary> {
        self.registry.list()
    }

    pub fn select_tank(&mut self, id: &str) -> AppResult<()> {
        self.registry.select(id)
    }

    pub fn current_tank(&self) -> TankInfo {
        self.registry.current().info()
    }

    pub fn delete_tank(&mut self, id: &str) -> AppResult<()> {
        self.registry.delete(id)
    }

    /// Add measured readings; scalars and sequences are both accepted.
    pub fn append_calibration<H: IntoValues, V: IntoValues>(
        &mut self,
        heights: H,
        volumes: V,
        tank_id: Option<&str>,
    ) -> AppResult<usize> {
        self.registry.append_points(heights, volumes, tank_id)
    }

    /// Read a `Pulgadas,Galones` file and merge its rows into the tank.
    pub fn import_csv(&mut self, path: &Path, tank_id: Option<&str>) -> AppResult<usize> {
        let tank = self.registry.resolve(tank_id)?;
        let id = tank.id().to_string();
        let points = tc_store::import_csv(path, tank.diameter())?;
        let merged = self.registry.merge_points(&points, Some(&id))?;
        info!(id = %id, path = %path.display(), merged, "imported calibration csv");
        Ok(merged)
    }

    /// Write the current tank's dataset. Returns the number of rows.
    pub fn export_csv(&self, path: &Path) -> AppResult<usize> {
        let dataset = self.registry.current().dataset();
        let rows = tc_store::export_csv(path, dataset.heights(), dataset.volumes())?;
        info!(id = %self.registry.current_id(), path = %path.display(), rows, "exported calibration csv");
        Ok(rows)
    }

    pub fn save_config(&self, path: &Path) -> AppResult<()> {
        self.registry.save(path)
    }

    /// `false` when the file is missing or unusable; state is then unchanged.
    pub fn load_config(&mut self, path: &Path) -> bool {
        self.registry.load(path)
    }

    pub fn reset_to_analytic(
        &mut self,
        tank_id: Option<&str>,
        n_samples: Option<usize>,
    ) -> AppResult<()> {
        self.registry.reset_to_analytic(tank_id, n_samples)
    }

    pub fn dataset(&self, tank_id: Option<&str>) -> AppResult<&Dataset> {
        Ok(self.registry.resolve(tank_id)?.dataset())
    }

    /// Fit error of the tank's model against its own dataset.
    pub fn evaluate(&self, tank_id: Option<&str>) -> AppResult<FitMetrics> {
        let tank = self.registry.resolve(tank_id)?;
        let dataset = tank.dataset();
        Ok(evaluate(tank.model(), dataset.heights(), dataset.volumes())?)
    }
}

fn preserve_unreadable(path: &Path) -> bool {
    match tc_store::backup_file(path) {
        Ok(backup) => {
            warn!(path = %path.display(), backup = %backup.display(), "moved unreadable registry aside");
            true
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not back up unreadable registry; autosave disabled");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tc_calib::{ModelPreference, full_volume_gallons};
    use tc_core::{Tolerances, nearly_equal};

    fn interp_session() -> Session {
        let mut config = SessionConfig::in_memory();
        config.trainer.preference = ModelPreference::Interp;
        Session::open(config).unwrap()
    }

    #[test]
    fn compute_volume_reference_tank() {
        let session = interp_session();
        let tol = Tolerances::absolute(1e-6);
        assert_eq!(session.compute_volume(0.0, None, None).unwrap(), 0.0);
        let full = session.compute_volume(45.0, None, None).unwrap();
        assert!(nearly_equal(full, 488.834, Tolerances::absolute(1e-3)));
        let half = session.compute_volume(22.5, None, None).unwrap();
        assert!(nearly_equal(half, full / 2.0, tol));
    }

    #[test]
    fn compute_volume_overrides_dimensions() {
        let session = interp_session();
        let v = session.compute_volume(10.0, Some(20.0), Some(100.0)).unwrap();
        assert!(nearly_equal(
            v,
            full_volume_gallons(20.0, 100.0) / 2.0,
            Tolerances::absolute(1e-9)
        ));
        assert!(matches!(
            session.compute_volume(10.0, Some(0.0), None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            session.compute_volume(f64::NAN, None, None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn predict_matches_geometry_on_fresh_tank() {
        let session = interp_session();
        for h in [0.0, 0.125, 11.25, 22.5, 44.875, 45.0] {
            let predicted = session.predict_volume(h, None).unwrap();
            assert_eq!(predicted, session.compute_volume(h, None, None).unwrap());
        }
        assert!(matches!(
            session.predict_volume(1.0, Some("ghost")),
            Err(AppError::TankNotFound(_))
        ));
    }

    #[test]
    fn predictions_clamp_outside_tank() {
        let session = interp_session();
        assert_eq!(session.predict_volume(-5.0, None).unwrap(), 0.0);
        assert_eq!(
            session.predict_volume(99.0, None).unwrap(),
            session.predict_volume(45.0, None).unwrap()
        );
    }

    #[test]
    fn fill_percent_is_height_gauge() {
        let mut session = interp_session();
        assert_eq!(session.fill_percent(0.0).unwrap(), 0.0);
        assert_eq!(session.fill_percent(11.25).unwrap(), 25.0);
        assert_eq!(session.fill_percent(22.5).unwrap(), 50.0);
        assert_eq!(session.fill_percent(60.0).unwrap(), 100.0);
        assert_eq!(session.fill_percent(-2.0).unwrap(), 0.0);
        assert!(matches!(
            session.fill_percent(f64::NAN),
            Err(AppError::Validation(_))
        ));

        // a calibration reading does not move the gauge
        session.append_calibration(11.25, 400.0, None).unwrap();
        assert_eq!(session.fill_percent(11.25).unwrap(), 25.0);

        let id = session.create_tank("Small", 20.0, 40.0).unwrap();
        session.select_tank(&id).unwrap();
        assert_eq!(session.fill_percent(5.0).unwrap(), 25.0);
    }

    #[test]
    fn current_tank_follows_selection() {
        let mut session = interp_session();
        let id = session.create_tank("Spare", 30.0, 60.0).unwrap();
        session.select_tank(&id).unwrap();
        let info = session.current_tank();
        assert_eq!(info.id, id);
        assert_eq!(info.diameter, 30.0);
        assert_eq!(info.radius, 15.0);
        assert_eq!(info.point_count, 361);
        // unqualified compute uses the selected dimensions
        assert!(nearly_equal(
            session.compute_volume(30.0, None, None).unwrap(),
            full_volume_gallons(30.0, 60.0),
            Tolerances::absolute(1e-9)
        ));
    }

    #[test]
    fn evaluate_fresh_interp_is_exact() {
        let session = interp_session();
        let metrics = session.evaluate(None).unwrap();
        assert_eq!(metrics.samples, 361);
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.rmse, 0.0);
    }
}
