//! Catalog of the vision-transformer architectures registered by the
//! accompanying model definitions.
//!
//! The training script resolves `--model` through timm's registry, so names
//! outside this catalog may still be valid. Lookups here only drive
//! `--list-models` and the "unknown architecture" warning.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArchFamily {
    /// Plain ViT / DeiT.
    Deit,
    /// ViT with LLaMA-style blocks and rotary position embedding.
    VisionLlama,
    /// Pyramid VisionLLaMA with grouped attention.
    PyramidVisionLlama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArchInfo {
    pub name: &'static str,
    pub family: ArchFamily,
    pub img_size: u32,
    pub patch_size: u32,
    /// Final-stage width for pyramid models.
    pub embed_dim: u32,
    /// Total blocks across all stages.
    pub depth: u32,
    /// Final-stage head count for pyramid models.
    pub num_heads: u32,
}

const fn arch(
    name: &'static str,
    family: ArchFamily,
    img_size: u32,
    patch_size: u32,
    embed_dim: u32,
    depth: u32,
    num_heads: u32,
) -> ArchInfo {
    ArchInfo {
        name,
        family,
        img_size,
        patch_size,
        embed_dim,
        depth,
        num_heads,
    }
}

use ArchFamily::*;

pub const KNOWN_ARCHS: &[ArchInfo] = &[
    arch("deit_tiny_patch16_224", Deit, 224, 16, 192, 12, 3),
    arch("deit_small_gap_patch16_224", Deit, 224, 16, 384, 12, 6),
    arch("deit_base_patch16_384", Deit, 384, 16, 768, 12, 12),
    arch("vit_llama_rope_small_patch16", VisionLlama, 224, 16, 384, 12, 6),
    arch("vit_llama_rope_base_patch16", VisionLlama, 224, 16, 768, 12, 12),
    arch("vit_llama_rope_large_patch16", VisionLlama, 224, 16, 1024, 24, 16),
    arch("vit_llama_rope_large_as_patch16", VisionLlama, 224, 16, 1024, 24, 16),
    arch("pllama_wols_small_patch16", PyramidVisionLlama, 224, 4, 512, 18, 16),
    arch("pllama_wols_base_patch16", PyramidVisionLlama, 224, 4, 768, 24, 24),
    arch("pllama_wols_large_patch16", PyramidVisionLlama, 224, 4, 1024, 24, 32),
    arch("pllama_wols_large_as_patch16", PyramidVisionLlama, 224, 4, 1024, 24, 32),
];

pub fn lookup(name: &str) -> Option<&'static ArchInfo> {
    KNOWN_ARCHS.iter().find(|a| a.name == name)
}

/// Closest known name by edit distance, if it is plausibly a typo.
pub fn suggest(name: &str) -> Option<&'static str> {
    let max_distance = (name.len() / 3).max(2);
    KNOWN_ARCHS
        .iter()
        .map(|a| (a.name, edit_distance(name, a.name)))
        .filter(|(_, d)| *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(n, _)| n)
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
