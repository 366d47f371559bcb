//! Uncompressed 24-bit Targa output.
//!
//! ### Layout
//! * 18-byte header (22 when the maximum iteration count is recorded in the
//!   image-id field);
//! * `width × height` pixels, `B, G, R`, top row first (descriptor `0x20`).
//!
//! Pixels are collected in memory and written out by [`TargaWriter::finish`].
//! A writer dropped or [`abort`](TargaWriter::abort)ed before that leaves no
//! trace: a fresh file is deleted, an overlay target is left untouched.

use std::{
    fs::{self, File},
    io::{self, Cursor, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::error::TargaError;

const HEADER_LEN: usize = 18;
const IMAGE_TYPE_TRUECOLOR: u8 = 2;
const BITS_PER_PIXEL: u8 = 24;
const DESCRIPTOR_TOP_LEFT: u8 = 0x20;

enum Sink {
    /// Newly created file, header and background already on disk.
    Fresh(File),
    /// Copy of the overlay target; renamed over it on success.
    Overlay(NamedTempFile),
}

pub struct TargaWriter {
    path: PathBuf,
    width: usize,
    height: usize,
    data_offset: u64,
    body: Vec<u8>,
    sink: Option<Sink>,
}

fn header(width: usize, height: usize, max_iterations: Option<u32>) -> io::Result<Vec<u8>> {
    let mut h = Vec::with_capacity(HEADER_LEN + 4);
    h.write_u8(if max_iterations.is_some() { 4 } else { 0 })?;
    h.write_u8(0)?; // no colour map
    h.write_u8(IMAGE_TYPE_TRUECOLOR)?;
    h.extend_from_slice(&[0; 5]); // colour-map spec
    h.write_u16::<LE>(0)?; // x origin
    h.write_u16::<LE>(0)?; // y origin
    h.write_u16::<LE>(width as u16)?;
    h.write_u16::<LE>(height as u16)?;
    h.write_u8(BITS_PER_PIXEL)?;
    h.write_u8(DESCRIPTOR_TOP_LEFT)?;
    if let Some(maxit) = max_iterations {
        h.write_u32::<LE>(maxit)?;
    }
    Ok(h)
}

impl TargaWriter {
    /// Create `path` and fill it with `background` (RGB).
    pub fn create(
        path: &Path,
        width: usize,
        height: usize,
        max_iterations: Option<u32>,
        background: [u8; 3],
    ) -> Result<Self, TargaError> {
        let mut bytes = header(width, height, max_iterations)?;
        let data_offset = bytes.len() as u64;
        let [r, g, b] = background;
        let body: Vec<u8> = [b, g, r].repeat(width * height);
        bytes.extend_from_slice(&body);

        let mut file = File::create(path).map_err(|source| TargaError::CantOpen {
            path: path.to_path_buf(),
            source,
        })?;
        if let Err(e) = file.write_all(&bytes).and_then(|_| file.flush()) {
            drop(file);
            let _ = fs::remove_file(path);
            return Err(TargaError::from_write(path, e));
        }
        debug!("created {} ({width}×{height})", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            data_offset,
            body,
            sink: Some(Sink::Fresh(file)),
        })
    }

    /// Draw over an existing file, which must be an uncompressed 24-bit
    /// top-left image of exactly `width × height`.
    pub fn overlay(path: &Path, width: usize, height: usize) -> Result<Self, TargaError> {
        let mut bytes = Vec::new();
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(|source| TargaError::CantOpen {
                path: path.to_path_buf(),
                source,
            })?;

        let data_offset = validate(path, &bytes, width, height)?;
        let end = data_offset + width * height * 3;
        let body = bytes
            .get(data_offset..end)
            .ok_or_else(|| TargaError::WrongSize {
                path: path.to_path_buf(),
            })?
            .to_vec();

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)
            .map_err(|e| TargaError::from_write(path, e))?;
        debug!("overlaying {} ({width}×{height})", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            data_offset: data_offset as u64,
            body,
            sink: Some(Sink::Overlay(tmp)),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store one pixel, `[b, g, r]`. Pixels outside the frame are ignored.
    #[inline]
    pub fn put(&mut self, x: usize, y: usize, bgr: [u8; 3]) {
        if x < self.width && y < self.height {
            let at = (y * self.width + x) * 3;
            self.body[at..at + 3].copy_from_slice(&bgr);
        }
    }

    /// `[b, g, r]` at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y * self.width + x) * 3;
        Some([self.body[at], self.body[at + 1], self.body[at + 2]])
    }

    /// Write the pixels out and close the file.
    pub fn finish(mut self) -> Result<PathBuf, TargaError> {
        let path = self.path.clone();
        match self.sink.take() {
            Some(Sink::Fresh(mut file)) => {
                let res = file
                    .seek(SeekFrom::Start(self.data_offset))
                    .and_then(|_| file.write_all(&self.body))
                    .and_then(|_| file.flush());
                if let Err(e) = res {
                    drop(file);
                    let _ = fs::remove_file(&path);
                    return Err(TargaError::from_write(&path, e));
                }
            }
            Some(Sink::Overlay(mut tmp)) => {
                tmp.seek(SeekFrom::Start(self.data_offset))
                    .and_then(|_| tmp.write_all(&self.body))
                    .and_then(|_| tmp.flush())
                    .map_err(|e| TargaError::from_write(&path, e))?;
                tmp.persist(&path).map_err(|e| TargaError::from_write(&path, e.error))?;
            }
            None => {}
        }
        debug!("wrote {}", path.display());
        Ok(path)
    }

    /// Give up on the image; see the module docs for what remains on disk.
    pub fn abort(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        match self.sink.take() {
            Some(Sink::Fresh(file)) => {
                drop(file);
                if let Err(e) = fs::remove_file(&self.path) {
                    warn!("could not remove {}: {e}", self.path.display());
                }
            }
            Some(Sink::Overlay(tmp)) => drop(tmp),
            None => {}
        }
    }
}

impl Drop for TargaWriter {
    fn drop(&mut self) {
        self.discard();
    }
}

/// Check an overlay header, returning the offset of the pixel data.
fn validate(path: &Path, bytes: &[u8], width: usize, height: usize) -> Result<usize, TargaError> {
    let wrong_type = || TargaError::WrongType {
        path: path.to_path_buf(),
    };
    let mut rd = Cursor::new(bytes);
    let mut fields = || -> io::Result<(u8, u8, u8, u16, u16, u8, u8)> {
        let id_len = rd.read_u8()?;
        let map_type = rd.read_u8()?;
        let image_type = rd.read_u8()?;
        rd.seek(SeekFrom::Current(5 + 4))?;
        let w = rd.read_u16::<LE>()?;
        let h = rd.read_u16::<LE>()?;
        let depth = rd.read_u8()?;
        let desc = rd.read_u8()?;
        Ok((id_len, map_type, image_type, w, h, depth, desc))
    };
    let (id_len, map_type, image_type, w, h, depth, desc) = fields().map_err(|_| wrong_type())?;

    if map_type != 0 || image_type != IMAGE_TYPE_TRUECOLOR {
        return Err(wrong_type());
    }
    if w as usize != width || h as usize != height {
        return Err(TargaError::WrongSize {
            path: path.to_path_buf(),
        });
    }
    if depth != BITS_PER_PIXEL || desc != DESCRIPTOR_TOP_LEFT {
        return Err(wrong_type());
    }
    Ok(HEADER_LEN + id_len as usize)
}
