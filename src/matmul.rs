//! Small GEMM wrapper used by the layers.
//!
//! All products go through one strided kernel:
//! - default: a simple, safe triple-loop implementation
//! - optional: a faster backend via the `matrixmultiply` feature
//!
//! Transposes are expressed through strides, so no operand is ever copied.

use crate::{Error, Matrix, Result};

/// `A · B` with `A: (m, k)` and `B: (k, n)`.
pub(crate) fn matmul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let (m, k) = a.shape();
    let (k2, n) = b.shape();
    if k != k2 {
        return Err(Error::InvalidShape(format!(
            "cannot multiply {:?} by {:?}",
            a.shape(),
            b.shape()
        )));
    }

    let mut c = Matrix::zeros(m, n);
    gemm_f64(
        m,
        n,
        k,
        a.as_slice(),
        k,
        1,
        b.as_slice(),
        n,
        1,
        c.as_mut_slice(),
    );
    Ok(c)
}

/// `Aᵀ · B` with `A: (k, m)` and `B: (k, n)`.
pub(crate) fn matmul_at_b(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let (k, m) = a.shape();
    let (k2, n) = b.shape();
    if k != k2 {
        return Err(Error::InvalidShape(format!(
            "cannot multiply transpose of {:?} by {:?}",
            a.shape(),
            b.shape()
        )));
    }

    let mut c = Matrix::zeros(m, n);
    // Reading A column-wise: element (i, p) of Aᵀ lives at p * m + i.
    gemm_f64(
        m,
        n,
        k,
        a.as_slice(),
        1,
        m,
        b.as_slice(),
        n,
        1,
        c.as_mut_slice(),
    );
    Ok(c)
}

/// `A · Bᵀ` with `A: (m, k)` and `B: (n, k)`.
pub(crate) fn matmul_a_bt(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let (m, k) = a.shape();
    let (n, k2) = b.shape();
    if k != k2 {
        return Err(Error::InvalidShape(format!(
            "cannot multiply {:?} by transpose of {:?}",
            a.shape(),
            b.shape()
        )));
    }

    let mut c = Matrix::zeros(m, n);
    gemm_f64(
        m,
        n,
        k,
        a.as_slice(),
        k,
        1,
        b.as_slice(),
        1,
        k,
        c.as_mut_slice(),
    );
    Ok(c)
}

/// `C = A · B` for a row-major, zero-initialized `C: (m, n)` and strided `A`/`B`.
#[allow(clippy::too_many_arguments)]
#[inline]
fn gemm_f64(
    m: usize,
    n: usize,
    k: usize,
    a: &[f64],
    rsa: usize,
    csa: usize,
    b: &[f64],
    rsb: usize,
    csb: usize,
    c: &mut [f64],
) {
    debug_assert_eq!(c.len(), m * n);
    if m == 0 || n == 0 || k == 0 {
        return;
    }

    #[cfg(feature = "matrixmultiply")]
    {
        // SAFETY: the callers above derive every stride from the operands' own shapes, so all
        // indices the kernel touches stay inside `a`, `b` and `c`.
        unsafe {
            matrixmultiply::dgemm(
                m,
                k,
                n,
                1.0,
                a.as_ptr(),
                rsa as isize,
                csa as isize,
                b.as_ptr(),
                rsb as isize,
                csb as isize,
                0.0,
                c.as_mut_ptr(),
                n as isize,
                1,
            );
        }
    }

    #[cfg(not(feature = "matrixmultiply"))]
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0_f64;
            for p in 0..k {
                acc = a[i * rsa + p * csa].mul_add(b[p * rsb + j * csb], acc);
            }
            c[i * n + j] = acc;
        }
    }
}
