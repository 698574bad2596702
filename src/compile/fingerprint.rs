use std::fmt;

use xxhash_rust::xxh3::Xxh3;

use crate::{
    compile::graph::{RenderGraph, RenderNode},
    timeline::model::ParamValue,
};

const XXH3_SEED: u64 = 0x6d6f_6e74_6167_6531;

/// 128-bit structural digest of a [`RenderGraph`].
///
/// Equal graphs (same shaders, wiring and parameter bits) produce equal fingerprints across runs
/// and platforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphFingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

impl fmt::Display for GraphFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

pub(crate) fn fingerprint_graph(graph: &RenderGraph) -> GraphFingerprint {
    let mut h = StableHasher::new();
    h.write_u32(graph.nodes.len() as u32);
    for node in &graph.nodes {
        write_node(&mut h, node);
    }
    h.write_u32(graph.output.0);
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    fn finish(self) -> GraphFingerprint {
        let v = self.inner.digest128();
        GraphFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

fn write_node(h: &mut StableHasher, node: &RenderNode) {
    h.write_u32(node.id.0);
    h.write_str(node.shader.as_str());

    h.write_u32(node.parameters.len() as u32);
    for (k, v) in &node.parameters {
        h.write_str(k);
        write_param(h, v);
    }

    h.write_u32(node.inputs.len() as u32);
    for b in &node.inputs {
        h.write_str(&b.port);
        h.write_u32(b.slot);
        h.write_u32(b.node.0);
        h.write_str(&b.output);
    }
}

fn write_param(h: &mut StableHasher, v: &ParamValue) {
    match v {
        ParamValue::Bool(b) => {
            h.write_u8(0);
            h.write_u8(u8::from(*b));
        }
        ParamValue::I64(i) => {
            h.write_u8(1);
            h.write_u64(*i as u64);
        }
        ParamValue::F64(f) => {
            h.write_u8(2);
            h.write_f64(*f);
        }
        ParamValue::Str(s) => {
            h.write_u8(3);
            h.write_str(s);
        }
        ParamValue::Color(c) => {
            h.write_u8(4);
            h.write_bytes(&[c.r, c.g, c.b, c.a]);
        }
        ParamValue::Rects(rects) => {
            h.write_u8(5);
            h.write_u32(rects.len() as u32);
            for r in rects {
                h.write_f64(r.x0);
                h.write_f64(r.y0);
                h.write_f64(r.x1);
                h.write_f64(r.y1);
            }
        }
    }
}
