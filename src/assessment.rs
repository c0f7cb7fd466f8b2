use std::fmt;

use serde::{Deserialize, Serialize};

use crate::soil::SoilData;
use crate::statistics::TerrainStatistics;

pub const FLOOD_HIGH: f64 = 0.7;
pub const FLOOD_MODERATE: f64 = 0.3;
pub const EROSION_HIGH: f64 = 50.0;
pub const EROSION_MODERATE: f64 = 20.0;

pub const HIGH_FLOW_ACCUMULATION: f64 = 1000.0;
pub const LOW_ELEVATION_RANGE: f64 = 10.0;
pub const STEEP_AREA_PERCENT: f64 = 30.0;
pub const ERODIBLE_CLAY_PERCENT: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Buckets a mean index; values equal to a threshold fall in the lower bucket.
    pub fn from_thresholds(value: f64, moderate: f64, high: f64) -> Self {
        if value > high {
            RiskLevel::High
        } else if value > moderate {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn flood(mean: f64) -> Self {
        Self::from_thresholds(mean, FLOOD_MODERATE, FLOOD_HIGH)
    }

    pub fn erosion(mean: f64) -> Self {
        Self::from_thresholds(mean, EROSION_MODERATE, EROSION_HIGH)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub contributing_factors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilTexture {
    pub clay: f64,
    pub sand: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilQuality {
    pub ph: f64,
    pub organic_carbon: f64,
    pub texture: SoilTexture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalAssessment {
    pub flood_risk: RiskAssessment,
    pub erosion_risk: RiskAssessment,
    pub soil_quality: SoilQuality,
}

fn factors(candidates: &[(bool, &str)]) -> Vec<String> {
    candidates
        .iter()
        .filter(|(triggered, _)| *triggered)
        .map(|(_, label)| label.to_string())
        .collect()
}

pub fn assess_flood(stats: &TerrainStatistics) -> RiskAssessment {
    RiskAssessment {
        level: RiskLevel::flood(stats.flood_risk_mean),
        contributing_factors: factors(&[
            (stats.flow_acc_max > HIGH_FLOW_ACCUMULATION, "High flow accumulation"),
            (stats.elevation_range < LOW_ELEVATION_RANGE, "Low-lying areas"),
        ]),
    }
}

pub fn assess_erosion(stats: &TerrainStatistics, soil: &SoilData) -> RiskAssessment {
    RiskAssessment {
        level: RiskLevel::erosion(stats.erosion_risk_mean),
        contributing_factors: factors(&[
            (stats.steep_areas_percent > STEEP_AREA_PERCENT, "Steep slopes"),
            (soil.mean_or_zero("clay") < ERODIBLE_CLAY_PERCENT, "Erodible soil"),
        ]),
    }
}

pub fn soil_quality(soil: &SoilData) -> SoilQuality {
    SoilQuality {
        ph: soil.mean_or_zero("phh2o"),
        organic_carbon: soil.mean_or_zero("soc"),
        texture: SoilTexture {
            clay: soil.mean_or_zero("clay"),
            sand: soil.mean_or_zero("sand"),
        },
    }
}

pub fn assess(stats: &TerrainStatistics, soil: &SoilData) -> EnvironmentalAssessment {
    let assessment = EnvironmentalAssessment {
        flood_risk: assess_flood(stats),
        erosion_risk: assess_erosion(stats, soil),
        soil_quality: soil_quality(soil),
    };
    log::info!(
        "flood risk {} ({:?}), erosion risk {} ({:?})",
        assessment.flood_risk.level,
        assessment.flood_risk.contributing_factors,
        assessment.erosion_risk.level,
        assessment.erosion_risk.contributing_factors
    );
    assessment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::SoilProperty;
    use maplit::btreemap;

    fn stats() -> TerrainStatistics {
        TerrainStatistics {
            min_elevation: 100.0,
            max_elevation: 150.0,
            mean_elevation: 125.0,
            elevation_range: 50.0,
            min_slope: 0.0,
            max_slope: 12.0,
            mean_slope: 4.0,
            steep_areas_percent: 0.0,
            mean_aspect: 180.0,
            predominant_direction: "S".to_string(),
            flow_acc_max: 10.0,
            flow_acc_mean: 2.0,
            flood_risk_mean: 0.1,
            flood_risk_max: 0.5,
            erosion_risk_mean: 5.0,
            erosion_risk_max: 12.0,
        }
    }

    #[test]
    fn test_flood_levels() {
        assert_eq!(RiskLevel::flood(0.75), RiskLevel::High);
        assert_eq!(RiskLevel::flood(0.5), RiskLevel::Moderate);
        assert_eq!(RiskLevel::flood(0.1), RiskLevel::Low);
        assert_eq!(RiskLevel::flood(0.7), RiskLevel::Moderate);
        assert_eq!(RiskLevel::flood(0.3), RiskLevel::Low);
    }

    #[test]
    fn test_erosion_levels() {
        assert_eq!(RiskLevel::erosion(51.0), RiskLevel::High);
        assert_eq!(RiskLevel::erosion(50.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::erosion(20.5), RiskLevel::Moderate);
        assert_eq!(RiskLevel::erosion(20.0), RiskLevel::Low);
    }

    #[test]
    fn test_nan_mean_is_low() {
        assert_eq!(RiskLevel::flood(f64::NAN), RiskLevel::Low);
    }

    #[test]
    fn test_no_factors() {
        let a = assess(&stats(), &SoilData::fallback());
        assert_eq!(a.flood_risk.level, RiskLevel::Low);
        assert!(a.flood_risk.contributing_factors.is_empty());
        assert!(a.erosion_risk.contributing_factors.is_empty());
    }

    #[test]
    fn test_all_factors() {
        let mut s = stats();
        s.flow_acc_max = 1001.0;
        s.elevation_range = 9.0;
        s.steep_areas_percent = 31.0;
        let soil = SoilData(btreemap! {
            "clay".to_string() => SoilProperty { mean: 14.0 },
        });

        let a = assess(&s, &soil);
        assert_eq!(
            a.flood_risk.contributing_factors,
            vec!["High flow accumulation", "Low-lying areas"]
        );
        assert_eq!(a.erosion_risk.contributing_factors, vec!["Steep slopes", "Erodible soil"]);
    }

    #[test]
    fn test_missing_clay_counts_as_erodible() {
        let a = assess_erosion(&stats(), &SoilData::default());
        assert_eq!(a.contributing_factors, vec!["Erodible soil"]);
    }

    #[test]
    fn test_soil_quality_mapping() {
        let q = soil_quality(&SoilData::fallback());
        assert_eq!(q.ph, 6.5);
        assert_eq!(q.organic_carbon, 2.0);
        assert_eq!(q.texture.clay, 20.0);
        assert_eq!(q.texture.sand, 40.0);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(assess(&stats(), &SoilData::fallback())).unwrap();
        assert_eq!(json["flood_risk"]["level"], "Low");
        assert_eq!(json["soil_quality"]["texture"]["clay"], 20.0);
    }
}
