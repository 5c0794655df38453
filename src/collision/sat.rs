//! Separating axis test and contact generation for every convex shape pair.
//!
//! Each pair function lists its candidate axes in a fixed order. The first separating
//! axis found is written back to the caller's hint so the next test can start from it.

use crate::math::{closest_point_to_segment_uncapped, Transform2D, Vector2, CMP_EPSILON};
use crate::shapes::{
    CapsuleShape, CircleShape, ConvexPolygonShape, RectangleShape, SegmentShape, Shape, ShapeType, Support,
};
use log::warn;
use std::cmp::Ordering;

/// One side of a narrow-phase query: a shape placed in the world, optionally moving
pub(crate) struct Side<'s, S: ?Sized> {
    pub shape: &'s S,
    pub xform: &'s Transform2D,
    pub motion: Vector2,
    pub margin: f32,
}

impl<'s, S: ?Sized> Clone for Side<'s, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'s, S: ?Sized> Copy for Side<'s, S> {}

impl<'s> Side<'s, dyn Shape> {
    fn downcast<S: Shape>(self) -> Option<Side<'s, S>> {
        let shape = self.shape.as_any().downcast_ref::<S>()?;
        Some(Side {
            shape,
            xform: self.xform,
            motion: self.motion,
            margin: self.margin,
        })
    }
}

/// Receives contact point pairs and the separating axis hint
pub(crate) struct ContactCollector<'a, 'f> {
    pub callback: Option<&'a mut (dyn FnMut(Vector2, Vector2) + 'f)>,
    pub sep_axis: Option<&'a mut Vector2>,
    pub swap: bool,
    pub collided: bool,
    pub normal: Vector2,
}

impl<'a, 'f> ContactCollector<'a, 'f> {
    pub fn new(
        callback: Option<&'a mut (dyn FnMut(Vector2, Vector2) + 'f)>,
        sep_axis: Option<&'a mut Vector2>,
        swap: bool,
    ) -> Self {
        Self {
            callback,
            sep_axis,
            swap,
            collided: false,
            normal: Vector2::zero(),
        }
    }

    /// Emits a contact as (point on A, point on B) in the caller's order
    #[inline]
    pub fn call(&mut self, a: Vector2, b: Vector2) {
        if let Some(callback) = self.callback.as_mut() {
            if self.swap {
                callback(b, a);
            } else {
                callback(a, b);
            }
        }
    }

    fn previous_axis(&self) -> Option<Vector2> {
        self.sep_axis.as_deref().copied().filter(|axis| !axis.is_zero())
    }

    fn store_axis(&mut self, axis: Vector2) {
        if let Some(sep_axis) = self.sep_axis.as_mut() {
            **sep_axis = axis;
        }
    }
}

fn contacts_point_point(a: &[Vector2], b: &[Vector2], collector: &mut ContactCollector) {
    collector.call(a[0], b[0]);
}

fn contacts_point_edge(a: &[Vector2], b: &[Vector2], collector: &mut ContactCollector) {
    let closest = closest_point_to_segment_uncapped(a[0], &[b[0], b[1]]);
    collector.call(a[0], closest);
}

fn contacts_edge_edge(a: &[Vector2], b: &[Vector2], collector: &mut ContactCollector) {
    let n = collector.normal;
    let t = n.tangent();
    let da = n.dot(&a[0]);
    let db = n.dot(&b[0]);

    // (projection on tangent, belongs to A, index)
    let mut ranked = [
        (t.dot(&a[0]), true, 0),
        (t.dot(&a[1]), true, 1),
        (t.dot(&b[0]), false, 0),
        (t.dot(&b[1]), false, 1),
    ];
    ranked.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(Ordering::Equal));

    for &(_, from_a, index) in &ranked[1..3] {
        let (pa, pb) = if from_a {
            let pa = a[index];
            (pa, n.plane_project(db, pa))
        } else {
            let pb = b[index];
            (n.plane_project(da, pb), pb)
        };

        if n.dot(&pa) > n.dot(&pb) - CMP_EPSILON {
            continue;
        }
        collector.call(pa, pb);
    }
}

fn contacts_from_supports(a: &Support, b: &Support, collector: &mut ContactCollector) {
    let (mut a, mut b) = (a.points(), b.points());
    if a.is_empty() || b.is_empty() {
        return;
    }

    if a.len() > b.len() {
        collector.swap = !collector.swap;
        collector.normal = -collector.normal;
        std::mem::swap(&mut a, &mut b);
    }

    match (a.len(), b.len()) {
        (1, 1) => contacts_point_point(a, b, collector),
        (1, _) => contacts_point_edge(a, b, collector),
        _ => contacts_edge_edge(a, b, collector),
    }
}

/// Axis test state for one shape pair
pub(crate) struct SeparatorAxisTest<'s, 'a, 'f, A, B, const CAST_A: bool, const CAST_B: bool, const WITH_MARGIN: bool> {
    a: Side<'s, A>,
    b: Side<'s, B>,
    best_depth: f32,
    best_axis: Vector2,
    collector: ContactCollector<'a, 'f>,
}

impl<'s, 'a, 'f, A, B, const CAST_A: bool, const CAST_B: bool, const WITH_MARGIN: bool>
    SeparatorAxisTest<'s, 'a, 'f, A, B, CAST_A, CAST_B, WITH_MARGIN>
where
    A: Shape,
    B: Shape,
{
    fn new(a: Side<'s, A>, b: Side<'s, B>, collector: ContactCollector<'a, 'f>) -> Self {
        Self {
            a,
            b,
            best_depth: f32::MAX,
            best_axis: Vector2::zero(),
            collector,
        }
    }

    /// Retests the axis that separated the pair last time, if any
    fn test_previous_axis(&mut self) -> bool {
        match self.collector.previous_axis() {
            Some(axis) => self.test_axis(axis),
            None => true,
        }
    }

    /// Tests the motion directions and their tangents
    fn test_cast(&mut self) -> bool {
        if CAST_A {
            let na = self.a.motion.normalize();
            if !self.test_axis(na) || !self.test_axis(na.tangent()) {
                return false;
            }
        }
        if CAST_B {
            let nb = self.b.motion.normalize();
            if !self.test_axis(nb) || !self.test_axis(nb.tangent()) {
                return false;
            }
        }
        true
    }

    /// Projects both shapes on `axis`. Returns false if the axis separates them.
    fn test_axis(&mut self, axis: Vector2) -> bool {
        let axis = if axis.is_zero_approx() { Vector2::unit_y() } else { axis };

        let (mut min_a, mut max_a) = if CAST_A {
            self.a.shape.project_range_cast(self.a.motion, axis, self.a.xform)
        } else {
            self.a.shape.project_range(axis, self.a.xform)
        };
        let (mut min_b, mut max_b) = if CAST_B {
            self.b.shape.project_range_cast(self.b.motion, axis, self.b.xform)
        } else {
            self.b.shape.project_range(axis, self.b.xform)
        };

        if WITH_MARGIN {
            min_a -= self.a.margin;
            max_a += self.a.margin;
            min_b -= self.b.margin;
            max_b += self.b.margin;
        }

        // Minkowski difference of the two intervals, centred on A
        let half_a = (max_a - min_a) * 0.5;
        let center_a = (min_a + max_a) * 0.5;
        min_b -= half_a + center_a;
        max_b += half_a - center_a;

        if min_b > 0.0 || max_b < 0.0 {
            self.collector.store_axis(axis);
            return false;
        }

        if min_b < 0.0 {
            min_b = -min_b;
        }

        if max_b <= min_b {
            if max_b < self.best_depth {
                self.best_depth = max_b;
                self.best_axis = axis;
            }
        } else if min_b < self.best_depth {
            self.best_depth = min_b;
            self.best_axis = -axis;
        }

        true
    }

    /// Tests the axis between two points, and its swept variants
    fn test_point(&mut self, a: Vector2, b: Vector2) -> bool {
        let (ma, mb) = (self.a.motion, self.b.motion);
        self.test_axis((a - b).normalize())
            && (!CAST_A || self.test_axis((a + ma - b).normalize()))
            && (!CAST_B || self.test_axis((a - (b + mb)).normalize()))
            && (!(CAST_A && CAST_B) || self.test_axis((a + ma - (b + mb)).normalize()))
    }

    fn generate_contacts(&mut self) {
        if self.best_axis.is_zero() {
            return;
        }

        self.collector.collided = true;
        if self.collector.callback.is_none() {
            return;
        }

        let axis = self.best_axis;
        let mut supports_a = if CAST_A {
            self.a.shape.get_supports_transformed_cast(self.a.motion, -axis, self.a.xform)
        } else {
            let xform = self.a.xform;
            self.a.shape
                .get_supports(xform.basis_xform_inv(-axis).normalize())
                .map(|p| xform.xform(p))
        };
        let mut supports_b = if CAST_B {
            self.b.shape.get_supports_transformed_cast(self.b.motion, axis, self.b.xform)
        } else {
            let xform = self.b.xform;
            self.b.shape
                .get_supports(xform.basis_xform_inv(axis).normalize())
                .map(|p| xform.xform(p))
        };

        if WITH_MARGIN {
            let (margin_a, margin_b) = (self.a.margin, self.b.margin);
            supports_a = supports_a.map(|p| p - axis * margin_a);
            supports_b = supports_b.map(|p| p + axis * margin_b);
        }

        self.collector.normal = axis;
        contacts_from_supports(&supports_a, &supports_b, &mut self.collector);

        // Overlapping now, so the old hint is stale
        if self.collector.previous_axis().is_some() {
            self.collector.store_axis(Vector2::zero());
        }
    }
}

type Sat<'s, 'a, 'f, A, B, const CA: bool, const CB: bool, const M: bool> = SeparatorAxisTest<'s, 'a, 'f, A, B, CA, CB, M>;

fn segment_segment<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, SegmentShape, SegmentShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_axis(a.shape.get_xformed_normal(a.xform)) {
        return;
    }
    if !sep.test_axis(b.shape.get_xformed_normal(b.xform)) {
        return;
    }

    if M {
        // Endpoints grow into circles
        for pa in [a.shape.get_a(), a.shape.get_b()] {
            for pb in [b.shape.get_a(), b.shape.get_b()] {
                if !sep.test_point(a.xform.xform(pa), b.xform.xform(pb)) {
                    return;
                }
            }
        }
    }

    sep.generate_contacts();
}

fn segment_circle<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, SegmentShape, CircleShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }

    let ea = a.xform.xform(a.shape.get_a());
    let eb = a.xform.xform(a.shape.get_b());
    if !sep.test_axis((eb - ea).normalize().tangent()) {
        return;
    }
    if !sep.test_point(ea, b.xform.origin) {
        return;
    }
    if !sep.test_point(eb, b.xform.origin) {
        return;
    }

    sep.generate_contacts();
}

fn segment_rectangle<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, SegmentShape, RectangleShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_axis(a.shape.get_xformed_normal(a.xform)) {
        return;
    }
    if !sep.test_axis(b.xform.x.normalize()) {
        return;
    }
    if !sep.test_axis(b.xform.y.normalize()) {
        return;
    }

    if M {
        let inv = b.xform.affine_inverse();
        let ea = a.xform.xform(a.shape.get_a());
        let eb = a.xform.xform(a.shape.get_b());

        let mut offsets = vec![Vector2::zero()];
        if CA {
            offsets.push(a.motion);
        }
        if CB {
            offsets.push(-b.motion);
        }
        if CA && CB {
            offsets.push(a.motion - b.motion);
        }

        for offset in offsets {
            for endpoint in [ea, eb] {
                if !sep.test_axis(b.shape.get_circle_axis(b.xform, &inv, endpoint + offset)) {
                    return;
                }
            }
        }
    }

    sep.generate_contacts();
}

fn segment_capsule<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, SegmentShape, CapsuleShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_axis(a.shape.get_xformed_normal(a.xform)) {
        return;
    }
    if !sep.test_axis(b.xform.x.normalize()) {
        return;
    }

    let caps = b.shape.get_cap_centers(b.xform);
    for endpoint in [a.shape.get_a(), a.shape.get_b()] {
        for cap in caps {
            if !sep.test_point(a.xform.xform(endpoint), cap) {
                return;
            }
        }
    }

    sep.generate_contacts();
}

fn segment_convex<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, SegmentShape, ConvexPolygonShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_axis(a.shape.get_xformed_normal(a.xform)) {
        return;
    }

    for i in 0..b.shape.get_point_count() {
        if !sep.test_axis(b.shape.get_xformed_segment_normal(b.xform, i)) {
            return;
        }
        if M {
            let vertex = b.xform.xform(b.shape.get_point(i));
            if !sep.test_point(a.xform.xform(a.shape.get_a()), vertex) {
                return;
            }
            if !sep.test_point(a.xform.xform(a.shape.get_b()), vertex) {
                return;
            }
        }
    }

    sep.generate_contacts();
}

fn circle_circle<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, CircleShape, CircleShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_point(a.xform.origin, b.xform.origin) {
        return;
    }

    sep.generate_contacts();
}

fn circle_rectangle<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, CircleShape, RectangleShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_axis(b.xform.x.normalize()) {
        return;
    }
    if !sep.test_axis(b.xform.y.normalize()) {
        return;
    }

    let inv = b.xform.affine_inverse();
    let center = a.xform.origin;
    if !sep.test_axis(b.shape.get_circle_axis(b.xform, &inv, center)) {
        return;
    }
    if CA && !sep.test_axis(b.shape.get_circle_axis(b.xform, &inv, center + a.motion)) {
        return;
    }
    if CB && !sep.test_axis(b.shape.get_circle_axis(b.xform, &inv, center - b.motion)) {
        return;
    }
    if CA && CB && !sep.test_axis(b.shape.get_circle_axis(b.xform, &inv, center - b.motion + a.motion)) {
        return;
    }

    sep.generate_contacts();
}

fn circle_capsule<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, CircleShape, CapsuleShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_axis(b.xform.x.normalize()) {
        return;
    }

    for cap in b.shape.get_cap_centers(b.xform) {
        if !sep.test_point(a.xform.origin, cap) {
            return;
        }
    }

    sep.generate_contacts();
}

fn circle_convex<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, CircleShape, ConvexPolygonShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }

    for i in 0..b.shape.get_point_count() {
        if !sep.test_point(a.xform.origin, b.xform.xform(b.shape.get_point(i))) {
            return;
        }
        if !sep.test_axis(b.shape.get_xformed_segment_normal(b.xform, i)) {
            return;
        }
    }

    sep.generate_contacts();
}

fn rectangle_rectangle<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, RectangleShape, RectangleShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }

    for axis in [a.xform.x, a.xform.y, b.xform.x, b.xform.y] {
        if !sep.test_axis(axis.normalize()) {
            return;
        }
    }

    if M {
        let inv_a = a.xform.affine_inverse();
        let inv_b = b.xform.affine_inverse();
        if !sep.test_axis(a.shape.get_box_axis(a.xform, &inv_a, b.shape, b.xform, &inv_b)) {
            return;
        }

        if CA || CB {
            let moved_a = a.xform.translated(a.motion);
            let moved_b = b.xform.translated(b.motion);
            let moved_a_inv = moved_a.affine_inverse();
            let moved_b_inv = moved_b.affine_inverse();

            if CA && !sep.test_axis(a.shape.get_box_axis(&moved_a, &moved_a_inv, b.shape, b.xform, &inv_b)) {
                return;
            }
            if CB && !sep.test_axis(a.shape.get_box_axis(a.xform, &inv_a, b.shape, &moved_b, &moved_b_inv)) {
                return;
            }
            if CA && CB && !sep.test_axis(a.shape.get_box_axis(&moved_a, &moved_a_inv, b.shape, &moved_b, &moved_b_inv)) {
                return;
            }
        }
    }

    sep.generate_contacts();
}

fn rectangle_capsule<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, RectangleShape, CapsuleShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_axis(a.xform.x.normalize()) {
        return;
    }
    if !sep.test_axis(a.xform.y.normalize()) {
        return;
    }
    if !sep.test_axis(b.xform.x.normalize()) {
        return;
    }

    let inv = a.xform.affine_inverse();
    for cap in b.shape.get_cap_centers(b.xform) {
        if !sep.test_axis(a.shape.get_circle_axis(a.xform, &inv, cap)) {
            return;
        }
        if CA && !sep.test_axis(a.shape.get_circle_axis(a.xform, &inv, cap - a.motion)) {
            return;
        }
        if CB && !sep.test_axis(a.shape.get_circle_axis(a.xform, &inv, cap + b.motion)) {
            return;
        }
        if CA && CB && !sep.test_axis(a.shape.get_circle_axis(a.xform, &inv, cap - a.motion + b.motion)) {
            return;
        }
    }

    sep.generate_contacts();
}

fn rectangle_convex<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, RectangleShape, ConvexPolygonShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_axis(a.xform.x.normalize()) {
        return;
    }
    if !sep.test_axis(a.xform.y.normalize()) {
        return;
    }

    let inv = a.xform.affine_inverse();
    for i in 0..b.shape.get_point_count() {
        if !sep.test_axis(b.shape.get_xformed_segment_normal(b.xform, i)) {
            return;
        }

        if M {
            // With margins every vertex pair can separate
            let vertex = b.xform.xform(b.shape.get_point(i));
            if !sep.test_axis(a.shape.get_circle_axis(a.xform, &inv, vertex)) {
                return;
            }
            if CA && !sep.test_axis(a.shape.get_circle_axis(a.xform, &inv, vertex - a.motion)) {
                return;
            }
            if CB && !sep.test_axis(a.shape.get_circle_axis(a.xform, &inv, vertex + b.motion)) {
                return;
            }
            if CA && CB && !sep.test_axis(a.shape.get_circle_axis(a.xform, &inv, vertex + b.motion - a.motion)) {
                return;
            }
        }
    }

    sep.generate_contacts();
}

fn capsule_capsule<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, CapsuleShape, CapsuleShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_axis(b.xform.x.normalize()) {
        return;
    }
    if !sep.test_axis(a.xform.x.normalize()) {
        return;
    }

    let caps_b = b.shape.get_cap_centers(b.xform);
    for cap_a in a.shape.get_cap_centers(a.xform) {
        for cap_b in caps_b {
            if !sep.test_point(cap_a, cap_b) {
                return;
            }
        }
    }

    sep.generate_contacts();
}

fn capsule_convex<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, CapsuleShape, ConvexPolygonShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }
    if !sep.test_axis(a.xform.x.normalize()) {
        return;
    }

    let caps = a.shape.get_cap_centers(a.xform);
    for i in 0..b.shape.get_point_count() {
        let vertex = b.xform.xform(b.shape.get_point(i));
        for cap in caps {
            if !sep.test_point(cap, vertex) {
                return;
            }
        }
        if !sep.test_axis(b.shape.get_xformed_segment_normal(b.xform, i)) {
            return;
        }
    }

    sep.generate_contacts();
}

fn convex_convex<const CA: bool, const CB: bool, const M: bool>(
    sep: &mut Sat<'_, '_, '_, ConvexPolygonShape, ConvexPolygonShape, CA, CB, M>,
) {
    let (a, b) = (sep.a, sep.b);
    if !sep.test_previous_axis() || !sep.test_cast() {
        return;
    }

    for i in 0..a.shape.get_point_count() {
        if !sep.test_axis(a.shape.get_xformed_segment_normal(a.xform, i)) {
            return;
        }
    }
    for i in 0..b.shape.get_point_count() {
        if !sep.test_axis(b.shape.get_xformed_segment_normal(b.xform, i)) {
            return;
        }
    }

    if M {
        for pa in a.shape.get_points() {
            for pb in b.shape.get_points() {
                if !sep.test_point(a.xform.xform(*pa), b.xform.xform(*pb)) {
                    return;
                }
            }
        }
    }

    sep.generate_contacts();
}

/// Runs the pair function for the (already ordered) shape types of `a` and `b`
fn dispatch<const CA: bool, const CB: bool, const M: bool>(
    a: Side<'_, dyn Shape>,
    b: Side<'_, dyn Shape>,
    collector: ContactCollector<'_, '_>,
) -> bool {
    macro_rules! solve_pair {
        ($func:ident, $ta:ty, $tb:ty) => {
            match (a.downcast::<$ta>(), b.downcast::<$tb>()) {
                (Some(a), Some(b)) => {
                    let mut separator = SeparatorAxisTest::<$ta, $tb, CA, CB, M>::new(a, b, collector);
                    $func(&mut separator);
                    separator.collector.collided
                }
                _ => {
                    warn!("shape type tag does not match its concrete type");
                    false
                }
            }
        };
    }

    use ShapeType::*;
    match (a.shape.shape_type(), b.shape.shape_type()) {
        (Segment, Segment) => solve_pair!(segment_segment, SegmentShape, SegmentShape),
        (Segment, Circle) => solve_pair!(segment_circle, SegmentShape, CircleShape),
        (Segment, Rectangle) => solve_pair!(segment_rectangle, SegmentShape, RectangleShape),
        (Segment, Capsule) => solve_pair!(segment_capsule, SegmentShape, CapsuleShape),
        (Segment, ConvexPolygon) => solve_pair!(segment_convex, SegmentShape, ConvexPolygonShape),
        (Circle, Circle) => solve_pair!(circle_circle, CircleShape, CircleShape),
        (Circle, Rectangle) => solve_pair!(circle_rectangle, CircleShape, RectangleShape),
        (Circle, Capsule) => solve_pair!(circle_capsule, CircleShape, CapsuleShape),
        (Circle, ConvexPolygon) => solve_pair!(circle_convex, CircleShape, ConvexPolygonShape),
        (Rectangle, Rectangle) => solve_pair!(rectangle_rectangle, RectangleShape, RectangleShape),
        (Rectangle, Capsule) => solve_pair!(rectangle_capsule, RectangleShape, CapsuleShape),
        (Rectangle, ConvexPolygon) => solve_pair!(rectangle_convex, RectangleShape, ConvexPolygonShape),
        (Capsule, Capsule) => solve_pair!(capsule_capsule, CapsuleShape, CapsuleShape),
        (Capsule, ConvexPolygon) => solve_pair!(capsule_convex, CapsuleShape, ConvexPolygonShape),
        (ConvexPolygon, ConvexPolygon) => solve_pair!(convex_convex, ConvexPolygonShape, ConvexPolygonShape),
        (type_a, type_b) => {
            warn!("no separating axis test for {:?} against {:?}", type_a, type_b);
            false
        }
    }
}

/// Separating axis test between two convex shapes (lines and rays excluded).
///
/// Contacts are reported through `callback` as (point on A, point on B) pairs. Returns
/// whether the shapes overlap, taking motions and margins into account.
#[allow(clippy::too_many_arguments)]
pub(crate) fn sat_calculate_penetration(
    shape_a: &dyn Shape,
    xform_a: &Transform2D,
    motion_a: Vector2,
    shape_b: &dyn Shape,
    xform_b: &Transform2D,
    motion_b: Vector2,
    callback: Option<&mut dyn FnMut(Vector2, Vector2)>,
    swap: bool,
    sep_axis: Option<&mut Vector2>,
    margin_a: f32,
    margin_b: f32,
) -> bool {
    let mut a = Side { shape: shape_a, xform: xform_a, motion: motion_a, margin: margin_a };
    let mut b = Side { shape: shape_b, xform: xform_b, motion: motion_b, margin: margin_b };
    let mut collector = ContactCollector::new(callback, sep_axis, swap);

    if a.shape.shape_type() > b.shape.shape_type() {
        std::mem::swap(&mut a, &mut b);
        collector.swap = !collector.swap;
    }

    let with_margin = margin_a != 0.0 || margin_b != 0.0;
    match (with_margin, !a.motion.is_zero(), !b.motion.is_zero()) {
        (false, false, false) => dispatch::<false, false, false>(a, b, collector),
        (false, true, false) => dispatch::<true, false, false>(a, b, collector),
        (false, false, true) => dispatch::<false, true, false>(a, b, collector),
        (false, true, true) => dispatch::<true, true, false>(a, b, collector),
        (true, false, false) => dispatch::<false, false, true>(a, b, collector),
        (true, true, false) => dispatch::<true, false, true>(a, b, collector),
        (true, false, true) => dispatch::<false, true, true>(a, b, collector),
        (true, true, true) => dispatch::<true, true, true>(a, b, collector),
    }
}
