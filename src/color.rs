use std::collections::BTreeMap;

use crate::community_algo::Partition;
use crate::types::CommunityId;

/// Display color per community id.
pub type ColorMap = BTreeMap<CommunityId, String>;

/// Source of display colors. Implementations must be pure:
/// the same seed gives the same color on every run and platform.
pub trait ColorAssigner {
    fn color_for(&self, community: CommunityId) -> String;

    /// Color for a node without community, derived from its own id.
    fn color_for_node(&self, node_id: &str) -> String;

    fn color_map(&self, partition: &Partition) -> ColorMap {
        (0..partition.community_count())
            .map(|community| (community, self.color_for(community)))
            .collect()
    }
}

/// Light pastel colors from a fixed hash of the seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightPalette;

// Saturation and lightness ranges, in percent.
const SATURATION: (u64, u64) = (55, 90);
const LIGHTNESS: (u64, u64) = (70, 85);

impl LightPalette {
    fn from_seed(seed: &str) -> String {
        let hash = farmhash::hash64(seed.as_bytes());
        let hue = (hash % 360) as f64;
        let saturation = pick(hash >> 16, SATURATION) as f64 / 100.0;
        let lightness = pick(hash >> 32, LIGHTNESS) as f64 / 100.0;
        let (r, g, b) = hsl_to_rgb(hue, saturation, lightness);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl ColorAssigner for LightPalette {
    fn color_for(&self, community: CommunityId) -> String {
        LightPalette::from_seed(&format!("community:{}", community))
    }

    fn color_for_node(&self, node_id: &str) -> String {
        LightPalette::from_seed(&format!("node:{}", node_id))
    }
}

fn pick(bits: u64, (low, high): (u64, u64)) -> u64 {
    low + (bits & 0xffff) % (high - low + 1)
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let channel = |value: f64| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (channel(r), channel(g), channel(b))
}
