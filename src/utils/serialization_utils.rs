use geo::Coord;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serializes a quadrilateral as `[[x, y], [x, y], [x, y], [x, y]]`.
pub mod point_pairs {
    use super::*;

    pub fn serialize<S>(coords: &[Coord<i32>; 4], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let pairs: Vec<[i32; 2]> = coords.iter().map(|c| [c.x, c.y]).collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[Coord<i32>; 4], D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs: Vec<[i32; 2]> = Vec::deserialize(deserializer)?;
        if pairs.len() != 4 {
            return Err(serde::de::Error::custom("Expected 4 points"));
        }
        Ok([
            Coord {
                x: pairs[0][0],
                y: pairs[0][1],
            },
            Coord {
                x: pairs[1][0],
                y: pairs[1][1],
            },
            Coord {
                x: pairs[2][0],
                y: pairs[2][1],
            },
            Coord {
                x: pairs[3][0],
                y: pairs[3][1],
            },
        ])
    }
}
