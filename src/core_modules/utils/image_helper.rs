pub mod image_helper {
    use image::{ImageEncoder, RgbImage};
    use std::io::{BufWriter, Write};
    use std::path::Path;

    /// Writes an RGB raster to `path` as PNG, creating or truncating the file.
    pub fn save_png(path: &Path, image: &RgbImage) -> Result<(), image::error::ImageError> {
        let mut output = BufWriter::new(std::fs::File::create(path)?);
        let encoder = image::codecs::png::PngEncoder::new(&mut output);

        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        // Surface the final write instead of losing it on drop.
        output.flush()?;

        Ok(())
    }
}
