//! QR code decoding

use image::DynamicImage;

/// Finds and decodes every QR code in an image
pub trait QrDecoder: Send + Sync {
    /// Returns decoded payloads in detection order; undecodable grids are skipped
    fn decode(&self, image: &DynamicImage) -> Vec<String>;
}

/// Pure-Rust decoder backed by `rqrr`
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl QrDecoder for RqrrDecoder {
    fn decode(&self, image: &DynamicImage) -> Vec<String> {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| luma.get_pixel(x as u32, y as u32).0[0],
        );

        prepared
            .detect_grids()
            .into_iter()
            .filter_map(|grid| match grid.decode() {
                Ok((_, content)) => Some(content),
                Err(e) => {
                    tracing::debug!("Skipping undecodable QR grid: {:?}", e);
                    None
                }
            })
            .collect()
    }
}

/// Appends payloads not already present, keeping first-seen order
pub(crate) fn merge_distinct(into: &mut Vec<String>, payloads: Vec<String>) {
    for payload in payloads {
        if !into.contains(&payload) {
            into.push(payload);
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{DynamicImage, GrayImage, Luma};

    /// Version 1-M code holding `qa@acme.test`, mask 0; `#` is a dark module
    pub const ACME_QR: [&str; 21] = [
        "#######...##..#######",
        "#.....#.#.###.#.....#",
        "#.###.#.......#.###.#",
        "#.###.#..##...#.###.#",
        "#.###.#.#####.#.###.#",
        "#.....#..###..#.....#",
        "#######.#.#.#.#######",
        "..........#..........",
        "#.#.#.#..#..#...#..#.",
        "####...##..#..####.##",
        "###..###.###....#####",
        "###....#...##........",
        "####.####.##.#.##.#.#",
        "........####...###..#",
        "#######.....#.###.###",
        "#.....#..#.#.......#.",
        "#.###.#.##.##..#...#.",
        "#.###.#..##.#..###.#.",
        "#.###.#.##.########.#",
        "#.....#..#..#...#..#.",
        "#######.#.#.##..#..##",
    ];

    /// Draws `rows` at `scale` pixels per module inside a four-module quiet zone
    pub fn render_qr(rows: &[&str], scale: u32) -> GrayImage {
        let quiet = 4;
        let modules = rows.len() as u32 + 2 * quiet;
        GrayImage::from_fn(modules * scale, modules * scale, |x, y| {
            let (column, row) = (x / scale, y / scale);
            let dark = column >= quiet
                && row >= quiet
                && rows
                    .get((row - quiet) as usize)
                    .and_then(|line| line.as_bytes().get((column - quiet) as usize))
                    == Some(&b'#');
            if dark {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    pub fn acme_qr_image() -> DynamicImage {
        DynamicImage::ImageLuma8(render_qr(&ACME_QR, 8))
    }
}
