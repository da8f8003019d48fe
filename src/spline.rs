use glam::Vec3;

/// Spline order: the number of control points influencing each span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Linear = 2,
    Quadratic = 3,
    Cubic = 4,
    Quartic = 5,
}

impl Order {
    /// Highest order usable with the given number of control points.
    pub fn for_points(count: usize) -> Option<Order> {
        match count {
            0 | 1 => None,
            2 => Some(Order::Linear),
            3 => Some(Order::Quadratic),
            _ => Some(Order::Cubic),
        }
    }
}

/// Open-uniform NURBS over 3D control points, evaluated with the
/// Cox-de Boor recursion.
#[derive(Debug, Clone)]
pub struct NurbSpline {
    order: Order,
    control_points: Vec<Vec3>,
    knots: Vec<f32>,
}

impl NurbSpline {
    /// Builds a spline over the control points, generating an open-uniform
    /// knot vector.
    ///
    /// The order must not exceed the number of control points.
    pub fn new(order: Order, control_points: Vec<Vec3>) -> Self {
        debug_assert!(order as usize <= control_points.len());
        let knots_size = control_points.len() + order as usize;

        let mut spline = Self {
            order,
            control_points,
            knots: Vec::with_capacity(knots_size),
        };
        spline.generate_knots();
        spline
    }

    /// Exclusive upper bound for evaluation parameters.
    pub fn eval_limit(&self) -> f32 {
        self.knots[self.knots.len() - 1]
    }

    /// Evaluates the spline at `u`, which must be below [`eval_limit`](Self::eval_limit).
    pub fn evaluate_at(&self, u: f32) -> Vec3 {
        debug_assert!(u < self.eval_limit());

        let order = self.order as usize;
        let start_idx = (u.floor() as usize).min(self.control_points.len() - order);

        let mut result = Vec3::ZERO;
        for idx in start_idx..(start_idx + order) {
            let contribution = self.cox_de_boor(idx, order, u);
            result += self.control_points[idx] * contribution;
        }
        result
    }

    /// Contribution of control point `idx` at parameter `u`.
    fn cox_de_boor(&self, idx: usize, order: usize, u: f32) -> f32 {
        debug_assert!(order > 0);

        if order == 1 {
            return if self.knots[idx] <= u && u <= self.knots[idx + 1] {
                1.0
            } else {
                0.0
            };
        }

        let span = self.knots[idx + order - 1] - self.knots[idx];
        let left = if span > 0.0 {
            (u - self.knots[idx]) / span * self.cox_de_boor(idx, order - 1, u)
        } else {
            0.0
        };

        let span = self.knots[idx + order] - self.knots[idx + 1];
        let right = if span > 0.0 {
            (self.knots[idx + order] - u) / span * self.cox_de_boor(idx + 1, order - 1, u)
        } else {
            0.0
        };

        left + right
    }

    /// Open-uniform knot vector: `order` zeros, a monotonic ramp, `order` end
    /// values.
    fn generate_knots(&mut self) {
        let order = self.order as usize;
        let mut val = 0.0;

        for _ in 0..order {
            self.knots.push(val);
        }
        val += 1.0;
        for _ in 0..(self.control_points.len() - order) {
            self.knots.push(val);
            val += 1.0;
        }
        for _ in 0..order {
            self.knots.push(val);
        }
    }
}
