//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Primitives are owned by a flat arena and never move after construction.
//! Building sorts contiguous ranges of an index array instead, so the tree
//! only ever refers to primitives by index.

use crate::{
    error::{SceneError, SceneResult},
    HitRecord, Hittable, HittableList,
};
use glint_math::{Aabb, Interval, Ray};
use rand::{Rng, RngCore};

/// Child slot of a BVH node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BvhChild {
    /// Index into the primitive arena.
    Primitive(usize),
    /// Index into the node arena.
    Node(usize),
}

/// Internal node with two children.
///
/// A node built over a single primitive has both children aliasing it.
#[derive(Debug, Clone, Copy)]
struct BvhNode {
    left: BvhChild,
    right: BvhChild,
    bbox: Aabb,
}

/// Binary tree of bounding boxes over a set of primitives.
pub struct Bvh {
    primitives: Vec<Box<dyn Hittable>>,
    nodes: Vec<BvhNode>,
    root: usize,
}

impl Bvh {
    /// Build a BVH from a list of hittable objects.
    ///
    /// Each range picks a random split axis. Boxes are taken over the
    /// shutter interval `[time0, time1]` so moving primitives stay inside
    /// their node for every ray time.
    pub fn new(
        objects: Vec<Box<dyn Hittable>>,
        time0: f32,
        time1: f32,
        rng: &mut dyn RngCore,
    ) -> SceneResult<Self> {
        if objects.is_empty() {
            return Err(SceneError::EmptyBvh);
        }

        let boxes = objects
            .iter()
            .enumerate()
            .map(|(index, object)| {
                object
                    .bounding_box(time0, time1)
                    .ok_or(SceneError::MissingBoundingBox { index })
            })
            .collect::<SceneResult<Vec<_>>>()?;

        let mut indices: Vec<usize> = (0..objects.len()).collect();
        let mut nodes = Vec::with_capacity(objects.len());
        let root = build(&mut nodes, &mut indices, &boxes, rng);

        log::debug!(
            "Built BVH over {} primitives ({} nodes)",
            objects.len(),
            nodes.len()
        );

        Ok(Self {
            primitives: objects,
            nodes,
            root,
        })
    }

    /// Build a BVH from the children of a [`HittableList`].
    pub fn from_list(
        list: HittableList,
        time0: f32,
        time1: f32,
        rng: &mut dyn RngCore,
    ) -> SceneResult<Self> {
        Self::new(list.into_objects(), time0, time1, rng)
    }

    /// Number of primitives in the tree.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Always false: construction rejects empty input.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn hit_child(&self, child: BvhChild, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        match child {
            BvhChild::Primitive(index) => self.primitives[index].hit(ray, ray_t),
            BvhChild::Node(index) => self.hit_node(index, ray, ray_t),
        }
    }

    fn hit_node(&self, index: usize, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let node = &self.nodes[index];
        if !node.bbox.hit(ray, ray_t) {
            return None;
        }

        let left = self.hit_child(node.left, ray, ray_t);
        if node.right == node.left {
            return left;
        }

        // Only check right up to closest hit
        let right_t = left.as_ref().map_or(ray_t, |rec| ray_t.with_max(rec.t));
        let right = self.hit_child(node.right, ray, right_t);

        right.or(left)
    }
}

/// Recursive construction over `indices`; returns the index of the new node.
fn build(
    nodes: &mut Vec<BvhNode>,
    indices: &mut [usize],
    boxes: &[Aabb],
    rng: &mut dyn RngCore,
) -> usize {
    let axis = rng.gen_range(0..3);
    indices.sort_by(|&a, &b| {
        let a_min = boxes[a].axis_interval(axis).min;
        let b_min = boxes[b].axis_interval(axis).min;
        a_min.total_cmp(&b_min)
    });

    let (left, right) = match indices.len() {
        1 => (BvhChild::Primitive(indices[0]), BvhChild::Primitive(indices[0])),
        2 => (BvhChild::Primitive(indices[0]), BvhChild::Primitive(indices[1])),
        n => {
            let (lower, upper) = indices.split_at_mut(n / 2);
            let left = build(nodes, lower, boxes, rng);
            let right = build(nodes, upper, boxes, rng);
            (BvhChild::Node(left), BvhChild::Node(right))
        }
    };

    let bbox = Aabb::surrounding(
        &child_box(nodes, boxes, left),
        &child_box(nodes, boxes, right),
    );
    nodes.push(BvhNode { left, right, bbox });
    nodes.len() - 1
}

fn child_box(nodes: &[BvhNode], boxes: &[Aabb], child: BvhChild) -> Aabb {
    match child {
        BvhChild::Primitive(index) => boxes[index],
        BvhChild::Node(index) => nodes[index].bbox,
    }
}

impl Hittable for Bvh {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        self.hit_node(self.root, ray, ray_t)
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        Some(self.nodes[self.root].bbox)
    }
}
