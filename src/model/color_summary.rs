/// Per-frame color statistics over a sampled square region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorSummary {
    pub avg_r: f64,
    pub avg_g: f64,
    pub avg_b: f64,
    pub brown_ratio: f64,
    pub dark_ratio: f64,
}

fn is_brown(r: u8, g: u8, b: u8) -> bool {
    r > 100 && r > g && g > b && i32::from(r) - i32::from(b) > 30
}

fn is_dark(r: u8, g: u8, b: u8) -> bool {
    r < 60 && g < 60 && b < 60
}

impl ColorSummary {
    /// Summarise tightly packed RGBA pixels. A trailing partial pixel is ignored;
    /// an empty sample yields all zeros.
    pub fn from_rgba(data: &[u8]) -> ColorSummary {
        let mut sums = [0u64; 3];
        let mut brown_count = 0u64;
        let mut dark_count = 0u64;
        let mut pixel_count = 0u64;

        for pixel in data.chunks_exact(4) {
            let (r, g, b) = (pixel[0], pixel[1], pixel[2]);
            sums[0] += u64::from(r);
            sums[1] += u64::from(g);
            sums[2] += u64::from(b);
            if is_brown(r, g, b) {
                brown_count += 1;
            }
            if is_dark(r, g, b) {
                dark_count += 1;
            }
            pixel_count += 1;
        }

        if pixel_count == 0 {
            return ColorSummary::default();
        }

        let n = pixel_count as f64;
        ColorSummary {
            avg_r: sums[0] as f64 / n,
            avg_g: sums[1] as f64 / n,
            avg_b: sums[2] as f64 / n,
            brown_ratio: brown_count as f64 / n,
            dark_ratio: dark_count as f64 / n,
        }
    }
}
