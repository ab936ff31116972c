use crate::error::PredictError;

/// Field names the model knows about. The artifact's `feature_names` list
/// must be a permutation of these; that list, not this constant, dictates
/// the order values are fed to the scaler.
pub const FIELD_NAMES: [&str; 7] = [
    "circuit",
    "quali_pos",
    "constructor",
    "driver",
    "driver_confidence",
    "constructor_reliability",
    "season",
];

/// One prediction request, fully resolved: labels already encoded, statistics
/// already looked up. Built fresh per request and consumed once.
#[derive(Debug, Clone, Copy)]
pub struct FeatureRecord {
    pub circuit: f64,
    pub quali_pos: f64,
    pub constructor: f64,
    pub driver: f64,
    pub driver_confidence: f64,
    pub constructor_reliability: f64,
    pub season: f64,
}

impl FeatureRecord {
    /// Flatten into the order the artifact dictates (its `feature_names`
    /// list is the authoritative input order).
    pub fn ordered(&self, feature_names: &[String]) -> Result<Vec<f64>, PredictError> {
        feature_names.iter().map(|name| self.value_of(name)).collect()
    }

    /// Same record with a different qualifying position, for the sweep.
    pub fn with_quali_pos(mut self, quali_pos: i32) -> Self {
        self.quali_pos = f64::from(quali_pos);
        self
    }

    fn value_of(&self, name: &str) -> Result<f64, PredictError> {
        match name {
            "circuit" => Ok(self.circuit),
            "quali_pos" => Ok(self.quali_pos),
            "constructor" => Ok(self.constructor),
            "driver" => Ok(self.driver),
            "driver_confidence" => Ok(self.driver_confidence),
            "constructor_reliability" => Ok(self.constructor_reliability),
            "season" => Ok(self.season),
            other => Err(PredictError::UnknownFeature(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FeatureRecord {
        FeatureRecord {
            circuit: 3.0,
            quali_pos: 7.0,
            constructor: 2.0,
            driver: 11.0,
            driver_confidence: 0.9,
            constructor_reliability: 0.8,
            season: 2023.0,
        }
    }

    #[test]
    fn ordering_follows_the_artifact_list() {
        let names: Vec<String> = ["season", "quali_pos", "driver"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let v = record().ordered(&names).unwrap();
        assert_eq!(v, vec![2023.0, 7.0, 11.0]);
    }

    #[test]
    fn unknown_feature_name_is_rejected() {
        let names = vec!["lap_time".to_string()];
        let err = record().ordered(&names).unwrap_err();
        assert_eq!(err, PredictError::UnknownFeature("lap_time".to_string()));
    }

    #[test]
    fn with_quali_pos_touches_only_that_field() {
        let r = record().with_quali_pos(15);
        assert_eq!(r.quali_pos, 15.0);
        assert_eq!(r.driver, 11.0);
        assert_eq!(r.season, 2023.0);
    }
}
