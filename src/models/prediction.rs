//! Prediction models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Accident description typed in by an operator.
///
/// Every field is optional in the request body and falls back to the
/// value of [`AccidentFeatures::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccidentFeatures {
    pub place: i64,
    pub catu: i64,
    pub sexe: i64,
    pub secu1: f64,
    pub year_acc: i64,
    pub victim_age: i64,
    pub catv: i64,
    pub obsm: i64,
    pub motor: i64,
    pub catr: i64,
    pub circ: i64,
    pub surf: i64,
    pub situ: i64,
    pub vma: i64,
    pub jour: i64,
    pub mois: i64,
    pub lum: i64,
    pub dep: i64,
    pub com: i64,
    pub agg_: i64,
    /// Intersection type, stored in the datasets under the `int` column
    pub inter: i64,
    pub atm: i64,
    pub col: i64,
    pub lat: f64,
    pub long: f64,
    pub hour: i64,
    pub nb_victim: i64,
    pub nb_vehicules: i64,
}

impl Default for AccidentFeatures {
    fn default() -> Self {
        Self {
            place: 10,
            catu: 3,
            sexe: 1,
            secu1: 0.0,
            year_acc: 2021,
            victim_age: 60,
            catv: 2,
            obsm: 1,
            motor: 1,
            catr: 3,
            circ: 2,
            surf: 1,
            situ: 1,
            vma: 50,
            jour: 7,
            mois: 12,
            lum: 5,
            dep: 77,
            com: 77317,
            agg_: 2,
            inter: 1,
            atm: 0,
            col: 6,
            lat: 48.60,
            long: 2.89,
            hour: 17,
            nb_victim: 2,
            nb_vehicules: 1,
        }
    }
}

impl AccidentFeatures {
    /// Dataset column names, in training order
    pub const COLUMNS: [&'static str; 28] = [
        "place", "catu", "sexe", "secu1", "year_acc", "victim_age", "catv", "obsm",
        "motor", "catr", "circ", "surf", "situ", "vma", "jour", "mois", "lum", "dep",
        "com", "agg_", "int", "atm", "col", "lat", "long", "hour", "nb_victim",
        "nb_vehicules",
    ];

    /// Values keyed by dataset column name (`inter` becomes `int`)
    pub fn to_columns(&self) -> Vec<(&'static str, f64)> {
        let values = [
            self.place as f64,
            self.catu as f64,
            self.sexe as f64,
            self.secu1,
            self.year_acc as f64,
            self.victim_age as f64,
            self.catv as f64,
            self.obsm as f64,
            self.motor as f64,
            self.catr as f64,
            self.circ as f64,
            self.surf as f64,
            self.situ as f64,
            self.vma as f64,
            self.jour as f64,
            self.mois as f64,
            self.lum as f64,
            self.dep as f64,
            self.com as f64,
            self.agg_ as f64,
            self.inter as f64,
            self.atm as f64,
            self.col as f64,
            self.lat,
            self.long,
            self.hour as f64,
            self.nb_victim as f64,
            self.nb_vehicules as f64,
        ];

        Self::COLUMNS.iter().copied().zip(values).collect()
    }
}

/// Binary intervention priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Prioritary,
    NotPrioritary,
}

impl Priority {
    pub const PRIORITARY_MESSAGE: &'static str = "The intervention is a priority.";
    pub const NOT_PRIORITARY_MESSAGE: &'static str = "The intervention is not a priority.";

    /// Only class 1 is prioritary
    pub fn from_prediction(prediction: i64) -> Self {
        if prediction == 1 {
            Self::Prioritary
        } else {
            Self::NotPrioritary
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Prioritary => Self::PRIORITARY_MESSAGE,
            Self::NotPrioritary => Self::NOT_PRIORITARY_MESSAGE,
        }
    }
}

/// One line of the test-sample prediction log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionLogEntry {
    pub request_id: String,
    pub user_name: String,
    pub time_stamp: String,
    pub input_features: BTreeMap<String, f64>,
    pub output_prediction: i64,
    pub f1_score_macro_average: f64,
    /// Single-row inference latency in seconds
    pub prediction_time: f64,
}
