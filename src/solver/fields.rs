use nalgebra::Vector2;
use wide::f64x4;

#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    pub values: Vec<f64>,
}

impl ScalarField {
    pub fn new(n: usize, val: f64) -> Self {
        Self {
            values: vec![val; n],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min_max(&self) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &self.values {
            min = min.min(v);
            max = max.max(v);
        }
        (min, max)
    }

    /// Clamps every value to at least `floor` and returns how many cells
    /// were clamped.
    pub fn bound_min(&mut self, floor: f64) -> usize {
        let mut clamped = 0;
        for v in &mut self.values {
            if *v < floor {
                *v = floor;
                clamped += 1;
            }
        }
        clamped
    }
}

/// Cell-centered scalar with an explicit previous-iterate slot.
///
/// `store_prev_iter` snapshots the current values; `relax` blends the
/// current values against that snapshot and is a no-op until a snapshot
/// exists.
#[derive(Clone, Debug)]
pub struct RelaxedField {
    pub field: ScalarField,
    prev_iter: Option<Vec<f64>>,
}

impl RelaxedField {
    pub fn new(n: usize, val: f64) -> Self {
        Self {
            field: ScalarField::new(n, val),
            prev_iter: None,
        }
    }

    pub fn store_prev_iter(&mut self) {
        self.prev_iter = Some(self.field.values.clone());
    }

    pub fn has_prev_iter(&self) -> bool {
        self.prev_iter.is_some()
    }

    pub fn assign(&mut self, values: ScalarField) {
        self.field = values;
    }

    /// Blends `prev + alpha * (current - prev)` in place. With `alpha`
    /// of 1.0 the current values are kept unchanged.
    pub fn relax(&mut self, alpha: f64) {
        let prev = match &self.prev_iter {
            Some(p) => p,
            None => return,
        };
        let n = self.field.values.len();
        let cur = &mut self.field.values;
        let v_alpha = f64x4::splat(alpha);
        let mut i = 0;
        while i + 4 <= n {
            let v_cur = f64x4::from(&cur[i..i + 4]);
            let v_prev = f64x4::from(&prev[i..i + 4]);
            let res = v_prev + v_alpha * (v_cur - v_prev);
            let arr: [f64; 4] = res.into();
            cur[i..i + 4].copy_from_slice(&arr);
            i += 4;
        }
        while i < n {
            cur[i] = prev[i] + alpha * (cur[i] - prev[i]);
            i += 1;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VectorField {
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
}

impl VectorField {
    pub fn new(n: usize, val: Vector2<f64>) -> Self {
        Self {
            vx: vec![val.x; n],
            vy: vec![val.y; n],
        }
    }

    pub fn len(&self) -> usize {
        self.vx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vx.is_empty()
    }

    /// self = coeff * other, componentwise.
    pub fn assign_scaled(&mut self, coeff: &ScalarField, other: &VectorField) {
        scaled_combine(&mut self.vx, &coeff.values, &other.vx, None);
        scaled_combine(&mut self.vy, &coeff.values, &other.vy, None);
    }

    /// self = coeff * (a - b), componentwise.
    pub fn assign_scaled_difference(
        &mut self,
        coeff: &ScalarField,
        a: &VectorField,
        b: &VectorField,
    ) {
        scaled_combine(&mut self.vx, &coeff.values, &a.vx, Some(&b.vx));
        scaled_combine(&mut self.vy, &coeff.values, &a.vy, Some(&b.vy));
    }

    /// self -= coeff * other, componentwise.
    pub fn sub_scaled(&mut self, coeff: &ScalarField, other: &VectorField) {
        sub_scaled_component(&mut self.vx, &coeff.values, &other.vx);
        sub_scaled_component(&mut self.vy, &coeff.values, &other.vy);
    }
}

// out = coeff * a or coeff * (a - b), SIMD body with scalar tail.
fn scaled_combine(out: &mut [f64], coeff: &[f64], a: &[f64], b: Option<&[f64]>) {
    let n = out.len();
    let mut i = 0;
    match b {
        Some(b) => {
            while i + 4 <= n {
                let v_c = f64x4::from(&coeff[i..i + 4]);
                let v_a = f64x4::from(&a[i..i + 4]);
                let v_b = f64x4::from(&b[i..i + 4]);
                let res = v_c * (v_a - v_b);
                let arr: [f64; 4] = res.into();
                out[i..i + 4].copy_from_slice(&arr);
                i += 4;
            }
            while i < n {
                out[i] = coeff[i] * (a[i] - b[i]);
                i += 1;
            }
        }
        None => {
            while i + 4 <= n {
                let v_c = f64x4::from(&coeff[i..i + 4]);
                let v_a = f64x4::from(&a[i..i + 4]);
                let res = v_c * v_a;
                let arr: [f64; 4] = res.into();
                out[i..i + 4].copy_from_slice(&arr);
                i += 4;
            }
            while i < n {
                out[i] = coeff[i] * a[i];
                i += 1;
            }
        }
    }
}

fn sub_scaled_component(out: &mut [f64], coeff: &[f64], a: &[f64]) {
    let n = out.len();
    let mut i = 0;
    while i + 4 <= n {
        let v_out = f64x4::from(&out[i..i + 4]);
        let v_c = f64x4::from(&coeff[i..i + 4]);
        let v_a = f64x4::from(&a[i..i + 4]);
        let res = v_out - v_c * v_a;
        let arr: [f64; 4] = res.into();
        out[i..i + 4].copy_from_slice(&arr);
        i += 4;
    }
    while i < n {
        out[i] -= coeff[i] * a[i];
        i += 1;
    }
}

/// Per-face scalar. Carries the mass flux phi as well as
/// face-interpolated quantities.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceField {
    pub values: Vec<f64>,
}

impl FaceField {
    pub fn new(n: usize, val: f64) -> Self {
        Self {
            values: vec![val; n],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn add_assign(&mut self, other: &FaceField) {
        let n = self.values.len();
        let mut i = 0;
        while i + 4 <= n {
            let v_s = f64x4::from(&self.values[i..i + 4]);
            let v_o = f64x4::from(&other.values[i..i + 4]);
            let res = v_s + v_o;
            let arr: [f64; 4] = res.into();
            self.values[i..i + 4].copy_from_slice(&arr);
            i += 4;
        }
        while i < n {
            self.values[i] += other.values[i];
            i += 1;
        }
    }
}

/// The mutable field group threaded through every capability call.
///
/// Pressure and density carry a previous-iterate slot because the outer
/// correctors under-relax them explicitly between pressure solves.
#[derive(Clone, Debug)]
pub struct FieldSet {
    pub p: RelaxedField,
    pub rho: RelaxedField,
    pub h: ScalarField,
    pub psi: ScalarField,
    pub u: VectorField,
    pub phi: FaceField,
    pub dp_dt: ScalarField,
}

impl FieldSet {
    pub fn new(n_cells: usize, n_faces: usize) -> Self {
        Self {
            p: RelaxedField::new(n_cells, 0.0),
            rho: RelaxedField::new(n_cells, 0.0),
            h: ScalarField::new(n_cells, 0.0),
            psi: ScalarField::new(n_cells, 0.0),
            u: VectorField::new(n_cells, Vector2::new(0.0, 0.0)),
            phi: FaceField::new(n_faces, 0.0),
            dp_dt: ScalarField::new(n_cells, 0.0),
        }
    }

    pub fn num_cells(&self) -> usize {
        self.p.field.len()
    }

    pub fn num_faces(&self) -> usize {
        self.phi.len()
    }
}
