//! `.npy` persistence for the produced arrays.
//!
//! Writes NumPy format version 1.0: magic, version, little-endian header
//! length, a Python dict literal header padded to a 64-byte boundary, then the
//! data as little-endian `f64` in C order.

use crate::error::{DataError, Result};
use crate::pipeline::context::FeatureMatrix;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the feature matrix.
pub const X_FILE: &str = "x_data.npy";

/// File name of the target vector.
pub const Y_FILE: &str = "y_data.npy";

const MAGIC: &[u8] = b"\x93NUMPY";
const HEADER_ALIGN: usize = 64;
// magic (6) + version (2) + header length (2)
const PREAMBLE_LEN: usize = 10;

/// Directory the arrays are written to: the one containing the input file.
pub fn output_dir_for(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn shape_literal(shape: &[usize]) -> String {
    match shape {
        [n] => format!("({},)", n),
        dims => format!(
            "({})",
            dims.iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Complete `.npy` v1.0 header (preamble included) for a little-endian `f64` array.
pub fn npy_header(shape: &[usize]) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': {}, }}",
        shape_literal(shape)
    );

    // Pad with spaces so that preamble + dict + '\n' is a multiple of 64.
    let unpadded = PREAMBLE_LEN + dict.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(PREAMBLE_LEN + header_len);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat_n(b' ', padding));
    out.push(b'\n');
    out
}

fn write_npy(path: &Path, shape: &[usize], values: &[f64]) -> Result<()> {
    let io_err = |source| DataError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut w = BufWriter::new(file);
    w.write_all(&npy_header(shape)).map_err(io_err)?;
    for value in values {
        w.write_all(&value.to_le_bytes()).map_err(io_err)?;
    }
    w.flush().map_err(io_err)?;
    Ok(())
}

/// Write a feature matrix as a 2-D `(rows, columns)` array.
pub fn write_npy_matrix(path: &Path, matrix: &FeatureMatrix) -> Result<()> {
    let (rows, cols) = matrix.shape();
    write_npy(path, &[rows, cols], matrix.as_slice())?;
    info!("Saved {} with shape ({}, {})", path.display(), rows, cols);
    Ok(())
}

/// Write a target vector as a 1-D array.
pub fn write_npy_vector(path: &Path, values: &[f64]) -> Result<()> {
    write_npy(path, &[values.len()], values)?;
    info!("Saved {} with shape ({},)", path.display(), values.len());
    Ok(())
}

/// Write both arrays into `dir` and return their paths.
pub fn save_arrays(dir: &Path, x: &FeatureMatrix, y: &[f64]) -> Result<(PathBuf, PathBuf)> {
    let x_path = dir.join(X_FILE);
    let y_path = dir.join(Y_FILE);
    write_npy_matrix(&x_path, x)?;
    write_npy_vector(&y_path, y)?;
    Ok((x_path, y_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_aligned() {
        for shape in [vec![4usize], vec![4, 12], vec![100_000, 250]] {
            let header = npy_header(&shape);
            assert_eq!(header.len() % HEADER_ALIGN, 0);
            assert_eq!(&header[..6], MAGIC);
            assert_eq!(&header[6..8], &[1, 0]);
            assert_eq!(*header.last().unwrap(), b'\n');

            let declared = u16::from_le_bytes([header[8], header[9]]) as usize;
            assert_eq!(declared + PREAMBLE_LEN, header.len());
        }
    }

    #[test]
    fn test_shape_literal() {
        assert_eq!(shape_literal(&[4]), "(4,)");
        assert_eq!(shape_literal(&[4, 12]), "(4, 12)");
    }

    #[test]
    fn test_header_dict() {
        let header = npy_header(&[3, 2]);
        let text = String::from_utf8(header[PREAMBLE_LEN..].to_vec()).unwrap();
        assert!(text.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (3, 2), }"));
    }

    #[test]
    fn test_output_dir_for() {
        assert_eq!(output_dir_for(Path::new("data/hh.csv")), PathBuf::from("data"));
        assert_eq!(output_dir_for(Path::new("hh.csv")), PathBuf::from("."));
    }

    #[test]
    fn test_save_arrays_writes_data() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = FeatureMatrix::from_columns(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            2,
        )
        .unwrap();

        let (x_path, y_path) = save_arrays(dir.path(), &matrix, &[10.0, 20.0]).unwrap();

        let x_bytes = std::fs::read(&x_path).unwrap();
        let data = &x_bytes[npy_header(&[2, 2]).len()..];
        assert_eq!(data.len(), 4 * 8);
        let first = f64::from_le_bytes(data[..8].try_into().unwrap());
        let second = f64::from_le_bytes(data[8..16].try_into().unwrap());
        assert_eq!((first, second), (1.0, 3.0));

        let y_bytes = std::fs::read(&y_path).unwrap();
        assert_eq!(y_bytes.len(), npy_header(&[2]).len() + 2 * 8);
    }
}
