use std::collections::BTreeSet;

use faunaguard_detect::Detection;
use serde::Serialize;
use tokio::sync::RwLock;

/// Outcome of the most recent decision cycle.
///
/// `animal_detected == true` always comes with an `animal_type` and a positive `confidence`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Alert {
    pub animal_detected: bool,
    pub animal_type: Option<String>,
    pub location: Option<String>,
    pub confidence: f64,
}

impl Alert {
    pub fn dangerous(animal: impl Into<String>, location: impl Into<String>, confidence: f64) -> Self {
        Self {
            animal_detected: true,
            animal_type: Some(animal.into()),
            location: Some(location.into()),
            confidence,
        }
    }
}

/// Single-slot holder for the latest alert. Only the engine writes to it.
#[derive(Debug, Default)]
pub struct LatestAlert {
    inner: RwLock<Alert>,
}

impl LatestAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Alert {
        self.inner.read().await.clone()
    }

    pub(crate) async fn record(&self, alert: Alert) {
        *self.inner.write().await = alert;
    }

    /// Drops the detected flag. `animal_type`, `location` and `confidence` keep the values of
    /// the previous alert.
    pub(crate) async fn clear(&self) {
        self.inner.write().await.animal_detected = false;
    }
}

/// Case-insensitive allow-list of labels that raise an alert.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DangerousSet {
    labels: BTreeSet<String>,
}

impl DangerousSet {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels = labels
            .into_iter()
            .map(|label| label.as_ref().trim().to_lowercase())
            .filter(|label| !label.is_empty())
            .collect();
        Self { labels }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(&label.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

/// Returns the first detection, in provider order, whose label is dangerous.
///
/// Later matches never win over earlier ones, even with a higher confidence. Detections with a
/// non-positive confidence, or below `min_confidence` when one is given, are passed over.
pub fn first_dangerous<'a>(
    detections: &'a [Detection],
    dangerous: &DangerousSet,
    min_confidence: Option<f64>,
) -> Option<&'a Detection> {
    detections.iter().find(|detection| {
        detection.confidence > 0.0
            && min_confidence.map_or(true, |min| detection.confidence >= min)
            && dangerous.contains(&detection.label)
    })
}
