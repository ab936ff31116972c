use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::ArtifactError;
use crate::features::FIELD_NAMES;
use crate::model::{NetworkParams, Predictor, ScalerParams};

// ---------- On-disk bundle ----------

#[derive(Debug, Deserialize)]
struct EncoderSet {
    driver: Vec<String>,
    constructor: Vec<String>,
    circuit: Vec<String>,
}

/// Everything the training pipeline exported, in one document: the
/// authoritative feature order, the fitted scaler and network, the three
/// label encoders (class lists, code = index), and the two statistics
/// tables keyed by encoded label.
#[derive(Debug, Deserialize)]
struct ArtifactBundle {
    feature_names: Vec<String>,
    scaler: ScalerParams,
    network: NetworkParams,
    encoders: EncoderSet,
    driver_confidence: BTreeMap<u32, f64>,
    constructor_reliability: BTreeMap<u32, f64>,
}

// ---------- Label encoding ----------

/// Bidirectional label <-> code map. Codes are dense indices into the class
/// list, matching the encoding the artifact was trained with.
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, u32>,
}

impl LabelEncoder {
    fn from_classes(name: &'static str, classes: Vec<String>) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::Shape(format!("{name} encoder has no classes")));
        }
        let mut index = HashMap::with_capacity(classes.len());
        for (code, label) in classes.iter().enumerate() {
            if index.insert(label.clone(), code as u32).is_some() {
                return Err(ArtifactError::Shape(format!(
                    "{name} encoder lists {label:?} twice"
                )));
            }
        }
        Ok(Self { classes, index })
    }

    pub fn encode(&self, label: &str) -> Option<u32> {
        self.index.get(label).copied()
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

// ---------- Validated, ready-to-serve artifact ----------

/// The loaded artifact: immutable for the lifetime of the process, shared
/// behind an `Arc` by every request handler.
pub struct Artifact {
    pub feature_names: Vec<String>,
    pub drivers: LabelEncoder,
    pub constructors: LabelEncoder,
    pub circuits: LabelEncoder,
    pub driver_confidence: BTreeMap<u32, f64>,
    pub constructor_reliability: BTreeMap<u32, f64>,
    pub predictor: Predictor,
}

impl Artifact {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read artifact at {}", path.display()))?;
        let bundle: ArtifactBundle =
            serde_json::from_str(&text).with_context(|| "failed to parse artifact bundle")?;
        Self::from_bundle(bundle).with_context(|| format!("invalid artifact {}", path.display()))
    }

    fn from_bundle(bundle: ArtifactBundle) -> Result<Self, ArtifactError> {
        validate_feature_names(&bundle.feature_names)?;

        let drivers = LabelEncoder::from_classes("driver", bundle.encoders.driver)?;
        let constructors = LabelEncoder::from_classes("constructor", bundle.encoders.constructor)?;
        let circuits = LabelEncoder::from_classes("circuit", bundle.encoders.circuit)?;

        validate_stats_keys(
            "driver_confidence",
            "driver",
            &bundle.driver_confidence,
            &drivers,
        )?;
        validate_stats_keys(
            "constructor_reliability",
            "constructor",
            &bundle.constructor_reliability,
            &constructors,
        )?;

        let predictor =
            Predictor::from_params(bundle.scaler, bundle.network, bundle.feature_names.len())?;

        Ok(Self {
            feature_names: bundle.feature_names,
            drivers,
            constructors,
            circuits,
            driver_confidence: bundle.driver_confidence,
            constructor_reliability: bundle.constructor_reliability,
            predictor,
        })
    }

    /// Drivers offered by the form: the confidence table's keys, decoded.
    /// Only labels with statistics are selectable, which is what keeps
    /// stats lookups infallible for form-originated requests.
    pub fn driver_options(&self) -> Vec<String> {
        self.driver_confidence
            .keys()
            .filter_map(|code| self.drivers.decode(*code))
            .map(str::to_string)
            .collect()
    }

    pub fn constructor_options(&self) -> Vec<String> {
        self.constructor_reliability
            .keys()
            .filter_map(|code| self.constructors.decode(*code))
            .map(str::to_string)
            .collect()
    }

    /// Circuits are not gated on statistics; the full class list is offered.
    pub fn circuit_options(&self) -> Vec<String> {
        self.circuits.classes().to_vec()
    }
}

fn validate_feature_names(names: &[String]) -> Result<(), ArtifactError> {
    if names.len() != FIELD_NAMES.len() {
        return Err(ArtifactError::Shape(format!(
            "artifact lists {} feature names, expected {}",
            names.len(),
            FIELD_NAMES.len()
        )));
    }
    for required in FIELD_NAMES {
        if !names.iter().any(|n| n == required) {
            return Err(ArtifactError::Shape(format!(
                "artifact feature names are missing {required:?}"
            )));
        }
    }
    Ok(())
}

fn validate_stats_keys(
    table: &'static str,
    encoder_name: &'static str,
    stats: &BTreeMap<u32, f64>,
    encoder: &LabelEncoder,
) -> Result<(), ArtifactError> {
    if stats.is_empty() {
        return Err(ArtifactError::Shape(format!("{table} table is empty")));
    }
    for code in stats.keys() {
        if encoder.decode(*code).is_none() {
            return Err(ArtifactError::StaleStats {
                table,
                encoder: encoder_name,
                code: *code,
            });
        }
    }
    Ok(())
}
