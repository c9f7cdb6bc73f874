use crate::{carto::colour::Rgba, error::Result};
use log::trace;
use std::{fs, path::Path};
use tiff::encoder::{colortype, TiffEncoder};

/// row-major rgba image, four bytes per pixel
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Raster {
    /// fully transparent raster
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 4],
        }
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            None
        } else {
            Some((y as usize * self.width + x as usize) * 4)
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Rgba {
        match self.offset(x, y) {
            Some(i) => [
                self.data[i],
                self.data[i + 1],
                self.data[i + 2],
                self.data[i + 3],
            ],
            None => [0, 0, 0, 0],
        }
    }

    /// writes outside the raster are dropped
    pub fn put(&mut self, x: i32, y: i32, rgba: Rgba) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 4].copy_from_slice(&rgba);
        }
    }

    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|byte| *byte = 0);
    }

    /// save raster to a .tif file
    pub fn save(&self, path: &Path) -> Result<()> {
        trace!("saving raster to {}", path.display());
        TiffEncoder::new(&mut fs::File::create(path)?)?.write_image::<colortype::RGBA8>(
            self.width as u32,
            self.height as u32,
            &self.data,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn put_and_get() {
        let mut raster = Raster::new(3, 2);
        raster.put(2, 1, [1, 2, 3, 4]);
        assert_eq!(raster.get(2, 1), [1, 2, 3, 4]);
        assert_eq!(raster.data[20..24], [1, 2, 3, 4]);
    }

    #[test]
    fn outside_is_transparent() {
        let mut raster = Raster::new(3, 2);
        raster.put(3, 0, [9, 9, 9, 9]);
        raster.put(-1, 0, [9, 9, 9, 9]);
        assert!(raster.data.iter().all(|&byte| byte == 0));
        assert_eq!(raster.get(5, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn save_writes_file() {
        let mut raster = Raster::new(2, 2);
        raster.put(0, 0, [255, 0, 0, 255]);
        let path = std::env::temp_dir().join("boreas-raster-test.tif");
        raster.save(&path).expect("test failed");
        assert!(path.exists());
        fs::remove_file(&path).expect("test failed");
    }
}
