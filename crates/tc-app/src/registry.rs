//! Tank registry: the tanks, the current selection, and the single commit
//! path that keeps each dataset, its model and the store in step.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tc_calib::ModelTrainer;
use tc_core::ensure_positive;
use tc_store::{DEFAULT_TANK_ID, RegistryDoc, StoreError};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::input::IntoValues;
use crate::tank::{Dataset, Tank, TankSummary};

pub const DEFAULT_DIAMETER_IN: f64 = 45.0;
pub const DEFAULT_LENGTH_IN: f64 = 71.0;
pub const DEFAULT_TANK_NAME: &str = "Main tank 45x71";
pub const DEFAULT_ANALYTIC_SAMPLES: usize = 361;
const UNNAMED_TANK: &str = "New tank";

/// Owns every tank. The tank with id [`DEFAULT_TANK_ID`] always exists and the
/// current index always points at a live tank.
#[derive(Debug, Clone)]
pub struct TankRegistry {
    tanks: Vec<Tank>,
    current: usize,
    trainer: ModelTrainer,
    analytic_samples: usize,
    autosave: Option<PathBuf>,
}

impl TankRegistry {
    /// Registry holding only the default tank.
    pub fn new(trainer: ModelTrainer, analytic_samples: usize) -> AppResult<Self> {
        let dataset = Dataset::analytic(DEFAULT_DIAMETER_IN, DEFAULT_LENGTH_IN, analytic_samples)?;
        let tank = Tank::new(
            DEFAULT_TANK_ID,
            DEFAULT_TANK_NAME,
            DEFAULT_DIAMETER_IN,
            DEFAULT_LENGTH_IN,
            dataset,
            &trainer,
        )?;
        Ok(Self {
            tanks: vec![tank],
            current: 0,
            trainer,
            analytic_samples,
            autosave: None,
        })
    }

    /// Document every mutation is written to before it returns.
    pub fn set_autosave(&mut self, path: Option<PathBuf>) {
        self.autosave = path;
    }

    pub fn autosave_path(&self) -> Option<&Path> {
        self.autosave.as_deref()
    }

    pub fn trainer(&self) -> &ModelTrainer {
        &self.trainer
    }

    pub fn tank_count(&self) -> usize {
        self.tanks.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tanks.iter().any(|t| t.id() == id)
    }

    pub fn get(&self, id: &str) -> AppResult<&Tank> {
        self.index_of(id).map(|idx| &self.tanks[idx])
    }

    pub fn current(&self) -> &Tank {
        &self.tanks[self.current]
    }

    pub fn current_id(&self) -> &str {
        self.current().id()
    }

    /// `id`, or the current tank when `None`.
    pub fn resolve(&self, id: Option<&str>) -> AppResult<&Tank> {
        self.target(id).map(|idx| &self.tanks[idx])
    }

    pub fn list(&self) -> Vec<TankSummary> {
        self.tanks.iter().map(Tank::summary).collect()
    }

    pub fn create(
        &mut self,
        name: &str,
        diameter: f64,
        length: f64,
        id: Option<&str>,
    ) -> AppResult<String> {
        let diameter = ensure_positive(diameter, "diameter")?;
        let length = ensure_positive(length, "length")?;
        let id = match id {
            Some(id) => {
                let id = id.trim();
                if id.is_empty() {
                    return Err(AppError::Validation("tank id must not be blank".to_string()));
                }
                if self.contains(id) {
                    return Err(AppError::Validation(format!("tank id '{id}' already exists")));
                }
                id.to_string()
            }
            None => self.next_tank_id(),
        };
        let name = match name.trim() {
            "" => UNNAMED_TANK,
            trimmed => trimmed,
        };

        let dataset = Dataset::analytic(diameter, length, self.analytic_samples)?;
        let tank = Tank::new(id.clone(), name, diameter, length, dataset, &self.trainer)?;
        self.tanks.push(tank);
        if let Err(err) = self.persist() {
            self.tanks.pop();
            return Err(err);
        }

        info!(id = %id, name, diameter, length, "created tank");
        Ok(id)
    }

    pub fn select(&mut self, id: &str) -> AppResult<()> {
        self.current = self.index_of(id)?;
        debug!(id, "selected tank");
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> AppResult<()> {
        if id == DEFAULT_TANK_ID {
            return Err(AppError::ProtectedTank(id.to_string()));
        }
        let idx = self.index_of(id)?;

        let previous_current = self.current;
        let removed = self.tanks.remove(idx);
        self.current = match previous_current.cmp(&idx) {
            Ordering::Equal => self.default_index(),
            Ordering::Greater => previous_current - 1,
            Ordering::Less => previous_current,
        };
        if let Err(err) = self.persist() {
            self.tanks.insert(idx, removed);
            self.current = previous_current;
            return Err(err);
        }

        info!(id, current = %self.current_id(), "deleted tank");
        Ok(())
    }

    /// Append calibration readings. Heights are clamped into `[0, D]`; volumes
    /// must be finite and non-negative. Returns the number of points added.
    pub fn append_points<H: IntoValues, V: IntoValues>(
        &mut self,
        heights: H,
        volumes: V,
        tank_id: Option<&str>,
    ) -> AppResult<usize> {
        let idx = self.target(tank_id)?;
        let heights = heights.into_values();
        let volumes = volumes.into_values();
        if heights.len() != volumes.len() {
            return Err(AppError::Validation(format!(
                "{} heights but {} volumes",
                heights.len(),
                volumes.len()
            )));
        }
        for (&h, &v) in heights.iter().zip(&volumes) {
            if !h.is_finite() {
                return Err(AppError::Validation(format!("height {h} is not a finite number")));
            }
            if !v.is_finite() || v < 0.0 {
                return Err(AppError::Validation(format!(
                    "volume {v} must be a finite, non-negative number"
                )));
            }
        }

        let points: Vec<(f64, f64)> = heights.into_iter().zip(volumes).collect();
        self.extend_dataset(idx, &points)
    }

    /// Merge already-parsed points (CSV import). Returns the number merged.
    pub fn merge_points(&mut self, points: &[(f64, f64)], tank_id: Option<&str>) -> AppResult<usize> {
        let idx = self.target(tank_id)?;
        if let Some(&(h, v)) = points.iter().find(|(h, v)| !h.is_finite() || !v.is_finite()) {
            return Err(AppError::Validation(format!(
                "point ({h}, {v}) is not a pair of finite numbers"
            )));
        }
        self.extend_dataset(idx, points)
    }

    /// Replace the dataset with fresh analytic samples.
    pub fn reset_to_analytic(
        &mut self,
        tank_id: Option<&str>,
        n_samples: Option<usize>,
    ) -> AppResult<()> {
        let idx = self.target(tank_id)?;
        let tank = &self.tanks[idx];
        let n = n_samples.unwrap_or(self.analytic_samples);
        let dataset = Dataset::analytic(tank.diameter(), tank.length(), n)?;
        self.commit(idx, dataset)
    }

    fn extend_dataset(&mut self, idx: usize, points: &[(f64, f64)]) -> AppResult<usize> {
        if points.is_empty() {
            return Ok(0);
        }
        let tank = &self.tanks[idx];
        let next = tank.dataset().extended(points, tank.diameter());
        self.commit(idx, next)?;
        Ok(points.len())
    }

    /// Retrain on `dataset`, swap it in, persist. On a persistence failure the
    /// previous dataset and model are put back.
    fn commit(&mut self, idx: usize, dataset: Dataset) -> AppResult<()> {
        let model = self.trainer.train(dataset.heights(), dataset.volumes())?;
        let points = dataset.len();
        let previous = self.tanks[idx].replace_calibration(dataset, model);
        if let Err(err) = self.persist() {
            let (dataset, model) = previous;
            self.tanks[idx].replace_calibration(dataset, model);
            return Err(err);
        }

        let tank = &self.tanks[idx];
        info!(id = %tank.id(), points, kind = %tank.model_kind(), "committed calibration dataset");
        Ok(())
    }

    fn persist(&self) -> AppResult<()> {
        match &self.autosave {
            Some(path) => self.save(path),
            None => Ok(()),
        }
    }

    pub fn to_document(&self) -> RegistryDoc {
        RegistryDoc {
            current_tank_id: self.current_id().to_string(),
            tanks: self
                .tanks
                .iter()
                .map(|t| (t.id().to_string(), t.to_def()))
                .collect(),
        }
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        tc_store::save_json(path, &self.to_document())?;
        debug!(path = %path.display(), "saved tank registry");
        Ok(())
    }

    /// Replace the registry with the document at `path`.
    ///
    /// `Ok(false)` when the file does not exist. Any error leaves `self` untouched.
    pub fn try_load(&mut self, path: &Path) -> AppResult<bool> {
        let (doc, report) = match tc_store::load_json(path) {
            Ok(loaded) => loaded,
            Err(StoreError::FileNotFound { .. }) => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        if !report.is_clean() {
            warn!(path = %path.display(), ?report, "repaired registry document while loading");
        }

        *self = self.rebuilt_from(doc)?;
        info!(path = %path.display(), tanks = self.tanks.len(), current = %self.current_id(), "loaded tank registry");
        Ok(true)
    }

    /// [`Self::try_load`] with failures reported through the log.
    pub fn load(&mut self, path: &Path) -> bool {
        match self.try_load(path) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to load tank registry; keeping current state");
                false
            }
        }
    }

    fn rebuilt_from(&self, doc: RegistryDoc) -> AppResult<Self> {
        let mut tanks = Vec::with_capacity(doc.tanks.len());
        for (id, def) in doc.tanks {
            let dataset = if def.heights.is_empty() {
                warn!(id = %id, "tank has no samples; reseeding analytic dataset");
                Dataset::analytic(def.diameter, def.length, self.analytic_samples)?
            } else {
                Dataset::new(def.heights, def.volumes)?
            };
            let tank = Tank::new(id, def.name, def.diameter, def.length, dataset, &self.trainer)?;
            if let Some(stored) = def.model_type
                && stored != tank.model_kind()
            {
                debug!(id = %tank.id(), %stored, trained = %tank.model_kind(), "model kind differs from stored tag");
            }
            tanks.push(tank);
        }

        let default_idx = tanks
            .iter()
            .position(|t| t.id() == DEFAULT_TANK_ID)
            .unwrap_or(0);
        let current = match tanks.iter().position(|t| t.id() == doc.current_tank_id) {
            Some(idx) => idx,
            None => {
                warn!(missing = %doc.current_tank_id, "stored current tank is gone; selecting default");
                default_idx
            }
        };

        Ok(Self {
            tanks,
            current,
            trainer: self.trainer.clone(),
            analytic_samples: self.analytic_samples,
            autosave: self.autosave.clone(),
        })
    }

    fn index_of(&self, id: &str) -> AppResult<usize> {
        self.tanks
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| AppError::TankNotFound(id.to_string()))
    }

    fn target(&self, id: Option<&str>) -> AppResult<usize> {
        match id {
            Some(id) => self.index_of(id),
            None => Ok(self.current),
        }
    }

    fn default_index(&self) -> usize {
        self.tanks
            .iter()
            .position(|t| t.id() == DEFAULT_TANK_ID)
            .unwrap_or(0)
    }

    fn next_tank_id(&self) -> String {
        let mut n = self.tanks.len();
        loop {
            let id = format!("tank_{n}");
            if !self.contains(&id) {
                return id;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_calib::{ModelKind, ModelPreference, TrainerConfig};

    fn registry() -> TankRegistry {
        let trainer = ModelTrainer::new(TrainerConfig {
            preference: ModelPreference::Interp,
            ..TrainerConfig::default()
        });
        TankRegistry::new(trainer, DEFAULT_ANALYTIC_SAMPLES).unwrap()
    }

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tc_app_registry_{}_{name}", std::process::id()))
    }

    #[test]
    fn starts_with_default_tank() {
        let reg = registry();
        assert_eq!(reg.tank_count(), 1);
        assert_eq!(reg.current_id(), DEFAULT_TANK_ID);
        let tank = reg.current();
        assert_eq!(tank.diameter(), 45.0);
        assert_eq!(tank.length(), 71.0);
        assert_eq!(tank.dataset().len(), 361);
        assert_eq!(tank.model_kind(), ModelKind::Interp);
    }

    #[test]
    fn create_generates_ids_and_seeds_dataset() {
        let mut reg = registry();
        let id = reg.create("Diesel", 30.0, 60.0, None).unwrap();
        assert_eq!(id, "tank_1");
        let tank = reg.get(&id).unwrap();
        assert_eq!(tank.name(), "Diesel");
        assert_eq!(tank.dataset().len(), 361);
        assert_eq!(tank.dataset().heights()[360], 30.0);
        // creating does not change the selection
        assert_eq!(reg.current_id(), DEFAULT_TANK_ID);
    }

    #[test]
    fn create_validates_before_mutating() {
        let mut reg = registry();
        for (d, l) in [(0.0, 10.0), (10.0, -1.0), (f64::NAN, 10.0)] {
            assert!(matches!(
                reg.create("Bad", d, l, None),
                Err(AppError::Validation(_))
            ));
        }
        assert!(matches!(
            reg.create("Dup", 10.0, 10.0, Some("default")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            reg.create("Blank", 10.0, 10.0, Some("  ")),
            Err(AppError::Validation(_))
        ));
        assert_eq!(reg.tank_count(), 1);
    }

    #[test]
    fn blank_name_gets_placeholder() {
        let mut reg = registry();
        let id = reg.create("   ", 10.0, 20.0, Some("spare")).unwrap();
        assert_eq!(reg.get(&id).unwrap().name(), UNNAMED_TANK);
    }

    #[test]
    fn generated_ids_skip_taken_ones() {
        let mut reg = registry();
        let a = reg.create("A", 10.0, 10.0, None).unwrap();
        let b = reg.create("B", 10.0, 10.0, None).unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("tank_1", "tank_2"));
        reg.delete("tank_1").unwrap();
        let c = reg.create("C", 10.0, 10.0, None).unwrap();
        assert_eq!(c, "tank_3");
    }

    #[test]
    fn list_preserves_insertion_order() {
        let mut reg = registry();
        reg.create("Z", 10.0, 10.0, Some("zeta")).unwrap();
        reg.create("A", 12.0, 10.0, Some("alpha")).unwrap();
        let ids: Vec<String> = reg.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["default", "zeta", "alpha"]);
        assert_eq!(reg.list()[2].point_count, 361);
    }

    #[test]
    fn select_unknown_is_not_found() {
        let mut reg = registry();
        assert!(matches!(reg.select("nope"), Err(AppError::TankNotFound(_))));
        assert_eq!(reg.current_id(), DEFAULT_TANK_ID);
    }

    #[test]
    fn default_tank_cannot_be_deleted() {
        let mut reg = registry();
        reg.create("Other", 10.0, 10.0, None).unwrap();
        assert!(matches!(
            reg.delete(DEFAULT_TANK_ID),
            Err(AppError::ProtectedTank(_))
        ));
        assert_eq!(reg.tank_count(), 2);
        assert!(reg.contains(DEFAULT_TANK_ID));
    }

    #[test]
    fn deleting_current_reselects_default() {
        let mut reg = registry();
        let id = reg.create("Other", 10.0, 10.0, None).unwrap();
        reg.select(&id).unwrap();
        reg.delete(&id).unwrap();
        assert_eq!(reg.current_id(), DEFAULT_TANK_ID);
        assert!(matches!(reg.delete(&id), Err(AppError::TankNotFound(_))));
    }

    #[test]
    fn deleting_earlier_tank_keeps_selection() {
        let mut reg = registry();
        reg.create("A", 10.0, 10.0, Some("a")).unwrap();
        reg.create("B", 20.0, 10.0, Some("b")).unwrap();
        reg.select("b").unwrap();
        reg.delete("a").unwrap();
        assert_eq!(reg.current_id(), "b");
        assert_eq!(reg.current().diameter(), 20.0);
    }

    #[test]
    fn append_clamps_and_overrides_interp() {
        let mut reg = registry();
        assert_eq!(reg.append_points(22.5, 250.0, None).unwrap(), 1);
        assert_eq!(reg.current().predict(22.5), 250.0);

        reg.append_points([60.0, -1.0], [500.0, 0.5], None).unwrap();
        let heights = reg.current().dataset().heights();
        assert_eq!(&heights[heights.len() - 2..], &[45.0, 0.0]);
        assert_eq!(reg.current().dataset().len(), 364);
    }

    #[test]
    fn append_rejects_malformed_input() {
        let mut reg = registry();
        let before = reg.current().dataset().clone();
        assert!(matches!(
            reg.append_points(vec![1.0, 2.0], vec![3.0], None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            reg.append_points(f64::NAN, 3.0, None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            reg.append_points(3.0, -1.0, None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            reg.append_points(3.0, 1.0, Some("ghost")),
            Err(AppError::TankNotFound(_))
        ));
        assert_eq!(reg.current().dataset(), &before);
    }

    #[test]
    fn append_targets_named_tank() {
        let mut reg = registry();
        let id = reg.create("Side", 20.0, 40.0, None).unwrap();
        reg.append_points(10.0, 30.0, Some(&id)).unwrap();
        assert_eq!(reg.get(&id).unwrap().dataset().len(), 362);
        assert_eq!(reg.current().dataset().len(), 361);
        assert_eq!(reg.get(&id).unwrap().predict(10.0), 30.0);
    }

    #[test]
    fn reset_replaces_dataset() {
        let mut reg = registry();
        reg.append_points(10.0, 99.0, None).unwrap();
        reg.reset_to_analytic(None, Some(91)).unwrap();
        let tank = reg.current();
        assert_eq!(tank.dataset().len(), 91);
        assert_eq!(tank.predict(10.0), tank.analytic_volume(10.0));
        assert!(matches!(
            reg.reset_to_analytic(None, Some(1)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn merge_of_nothing_is_noop() {
        let mut reg = registry();
        assert_eq!(reg.merge_points(&[], None).unwrap(), 0);
        assert_eq!(reg.current().dataset().len(), 361);
    }

    #[test]
    fn failed_persist_rolls_back() {
        let blocker = scratch("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut reg = registry();
        reg.set_autosave(Some(blocker.join("tanks.json")));

        assert!(reg.append_points(10.0, 99.0, None).is_err());
        assert_eq!(reg.current().dataset().len(), 361);
        assert_eq!(reg.current().predict(10.0), reg.current().analytic_volume(10.0));

        assert!(reg.create("X", 10.0, 10.0, None).is_err());
        assert_eq!(reg.tank_count(), 1);

        let _ = std::fs::remove_file(&blocker);
    }

    #[test]
    fn document_round_trip() {
        let path = scratch("roundtrip.json");
        let mut reg = registry();
        let id = reg.create("Second", 30.0, 90.0, None).unwrap();
        reg.append_points(12.0, 100.0, Some(&id)).unwrap();
        reg.select(&id).unwrap();
        reg.save(&path).unwrap();

        let mut fresh = registry();
        assert!(fresh.try_load(&path).unwrap());
        assert_eq!(fresh.list(), reg.list());
        assert_eq!(fresh.current_id(), id);
        assert_eq!(fresh.current().dataset(), reg.current().dataset());
        assert_eq!(fresh.current().predict(12.0), 100.0);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_of_missing_file_is_false() {
        let mut reg = registry();
        assert!(!reg.load(&scratch("absent.json")));
        assert_eq!(reg.tank_count(), 1);
    }
}
