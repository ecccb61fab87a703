use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Breadth,
    Height,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Length => "building_length",
            Self::Breadth => "building_breadth",
            Self::Height => "building_height",
        };
        write!(f, "{}", name)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    NonPositive(Dimension),
    NotFinite(Dimension),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NonPositive(dimension) => write!(f, "{} must be greater than zero", dimension),
            Self::NotFinite(dimension) => write!(f, "{} is not a finite number", dimension),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Dimensions of the inspected structure in meters. All three are required.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InspectionConfig {
    pub building_length: f32,
    pub building_breadth: f32,
    pub building_height: f32,
}

impl InspectionConfig {
    pub fn new(length: f32, breadth: f32, height: f32) -> Result<Self, Error> {
        let config =
            Self { building_length: length, building_breadth: breadth, building_height: height };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let dimensions = [
            (Dimension::Length, self.building_length),
            (Dimension::Breadth, self.building_breadth),
            (Dimension::Height, self.building_height),
        ];
        for (dimension, value) in dimensions {
            if !value.is_finite() {
                return Err(Error::NotFinite(dimension));
            }
            if value <= 0.0 {
                return Err(Error::NonPositive(dimension));
            }
        }
        Ok(())
    }

    pub fn perimeter(&self) -> f32 {
        2.0 * (self.building_length + self.building_breadth)
    }
}

mod test {
    #[test]
    fn test_validate() {
        use super::{Dimension, Error, InspectionConfig};

        assert!(InspectionConfig::new(20.0, 10.0, 8.0).is_ok());
        let result = InspectionConfig::new(20.0, 0.0, 8.0);
        assert_eq!(result, Err(Error::NonPositive(Dimension::Breadth)));
        let result = InspectionConfig::new(-1.0, 10.0, 8.0);
        assert_eq!(result, Err(Error::NonPositive(Dimension::Length)));
        let result = InspectionConfig::new(20.0, 10.0, f32::NAN);
        assert_eq!(result, Err(Error::NotFinite(Dimension::Height)));
    }

    #[test]
    fn test_deserialize() {
        use super::InspectionConfig;

        let json = r#"{"building_length": 20.0, "building_breadth": 10.0, "building_height": 8.0}"#;
        let config: InspectionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config, InspectionConfig::new(20.0, 10.0, 8.0).unwrap());
        assert_eq!(config.perimeter(), 60.0);

        let json = r#"{"building_length": 20.0, "building_breadth": 10.0}"#;
        assert!(serde_json::from_str::<InspectionConfig>(json).is_err());
    }
}
