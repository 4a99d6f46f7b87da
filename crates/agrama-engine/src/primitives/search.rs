//! `search` — one entry point over the semantic, lexical, graph,
//! temporal, and hybrid query paths.

use serde_json::{json, Value};

use agrama_core::errors::{AgramaResult, ValidationError};
use agrama_core::models::{NodeId, SearchHit, SearchMode, TraversalDirection};
use agrama_retrieval::{extract_snippet, fuse, run_parallel, FusionWeights};

use crate::cache::cache_key;
use crate::context::PrimitiveContext;
use crate::value::{optional_f64, optional_str, optional_usize, required_str};

pub fn run(ctx: &PrimitiveContext<'_>, args: &Value) -> AgramaResult<Value> {
    let mode_str = optional_str(args, "mode").unwrap_or("hybrid");
    let mode = SearchMode::parse(mode_str).ok_or_else(|| ValidationError::MalformedArgument {
        name: "mode".to_string(),
        reason: format!("unknown mode {mode_str:?}"),
    })?;
    let k = optional_usize(args, "k", 10);
    if k == 0 {
        return Ok(json!([]));
    }

    let key = cache_key("search", args);
    if let Some(cached) = ctx.caches().search(&key) {
        return Ok(cached);
    }

    // Result slots come from the fixed pool and go back after rendering.
    let mut hits = ctx.pools().hit_buffers.acquire();
    let filled = match mode {
        SearchMode::Lexical => lexical(ctx, args, k, &mut hits),
        SearchMode::Semantic => semantic(ctx, args, k, &mut hits),
        SearchMode::Graph => graph(ctx, args, k, &mut hits),
        SearchMode::Temporal => temporal(ctx, args, k, &mut hits),
        SearchMode::Hybrid => hybrid(ctx, args, k, &mut hits),
    };
    let result = filled.map(|_| render(ctx, &hits));
    ctx.pools().hit_buffers.release(hits);
    let result = result?;

    ctx.caches().store_search(key, result.clone());
    Ok(result)
}

fn query_of<'a>(args: &'a Value) -> AgramaResult<&'a str> {
    required_str(args, "query")
}

fn lexical(
    ctx: &PrimitiveContext<'_>,
    args: &Value,
    k: usize,
    out: &mut Vec<SearchHit>,
) -> AgramaResult<()> {
    let tokens = ctx.tokenizer().tokenize(query_of(args)?);
    for h in ctx.bm25().search(&tokens, k) {
        out.push(SearchHit {
            id: h.id,
            score: h.score,
            snippet: snippet_for(ctx, h.id, &tokens),
            components: Default::default(),
        });
    }
    Ok(())
}

fn semantic(
    ctx: &PrimitiveContext<'_>,
    args: &Value,
    k: usize,
    out: &mut Vec<SearchHit>,
) -> AgramaResult<()> {
    let query = query_of(args)?;
    let ef = optional_usize(args, "ef", ctx.config().hnsw.ef_search);
    let resolution = args
        .get("resolution")
        .and_then(Value::as_u64)
        .map(|r| r as usize);

    let vector = embed_cached(ctx, query)?;
    ctx.deadline.checkpoint()?;
    for h in ctx.hnsw().search(&vector, k, ef, resolution)? {
        out.push(SearchHit {
            id: h.id,
            score: h.score,
            snippet: None,
            components: Default::default(),
        });
    }
    Ok(())
}

fn graph(
    ctx: &PrimitiveContext<'_>,
    args: &Value,
    k: usize,
    out: &mut Vec<SearchHit>,
) -> AgramaResult<()> {
    let root = required_str(args, "root")?;
    let direction = direction_of(args)?;
    let max_depth = optional_usize(args, "max_depth", ctx.config().traversal.max_depth);

    let nodes = agrama_graph::expand_hops(
        ctx.graph(),
        NodeId::from_name(root),
        direction,
        max_depth,
    )?;
    for n in nodes.into_iter().take(k) {
        out.push(SearchHit {
            id: n.id,
            score: 1.0 / (1.0 + n.depth as f32),
            snippet: None,
            components: Default::default(),
        });
    }
    Ok(())
}

fn temporal(
    ctx: &PrimitiveContext<'_>,
    args: &Value,
    k: usize,
    out: &mut Vec<SearchHit>,
) -> AgramaResult<()> {
    let start_us = args.get("start_us").and_then(Value::as_u64).unwrap_or(0);
    let end_us = args
        .get("end_us")
        .and_then(Value::as_u64)
        .unwrap_or(u64::MAX);

    for (rank, (path, _ts, _count)) in ctx
        .content()
        .scan_range(start_us, end_us)
        .into_iter()
        .take(k)
        .enumerate()
    {
        let id = NodeId::from_name(&path);
        ctx.remember_name(id, &path);
        out.push(SearchHit {
            id,
            score: 1.0 / (1.0 + rank as f32),
            snippet: None,
            components: Default::default(),
        });
    }
    Ok(())
}

fn hybrid(
    ctx: &PrimitiveContext<'_>,
    args: &Value,
    k: usize,
    out: &mut Vec<SearchHit>,
) -> AgramaResult<()> {
    let query = query_of(args)?;
    let weights = FusionWeights::new(
        optional_f64(args, "alpha", 0.4) as f32,
        optional_f64(args, "beta", 0.4) as f32,
        optional_f64(args, "gamma", 0.2) as f32,
    )?;
    let context_node = optional_str(args, "context").map(NodeId::from_name);
    let tokens = ctx.tokenizer().tokenize(query);
    let vector = embed_cached(ctx, query)?;
    ctx.deadline.checkpoint()?;

    // Wider sub-queries than k so fusion has overlap to work with.
    let pool = (k * 3).max(10);
    let ef = ctx.config().hnsw.ef_search.max(pool);
    let bound = ctx.config().traversal.default_bound;

    let bm25 = ctx.bm25();
    let hnsw = ctx.hnsw();
    let graph_store = ctx.graph();
    let (lex, sem, gra) = run_parallel(
        || {
            bm25.search(&tokens, pool)
                .into_iter()
                .map(|h| (h.id, h.score))
                .collect()
        },
        || {
            hnsw.search(&vector, pool, ef, None)
                .map(|hits| hits.into_iter().map(|h| (h.id, h.score)).collect())
                .unwrap_or_default()
        },
        || match context_node {
            Some(root) if graph_store.contains(root) => agrama_graph::shortest_paths(
                graph_store,
                &[root],
                bound,
                TraversalDirection::Bidirectional,
            )
            .map(|pairs| {
                pairs
                    .into_iter()
                    // The context node is the reference point, not a
                    // proximity signal about itself.
                    .filter(|&(id, _)| Some(id) != context_node)
                    .map(|(id, d)| (id, 1.0 / (1.0 + d as f32)))
                    .collect()
            })
            .unwrap_or_default(),
            _ => Vec::new(),
        },
    );

    ctx.deadline.checkpoint()?;
    for mut hit in fuse(&lex, &sem, &gra, weights, k) {
        hit.snippet = snippet_for(ctx, hit.id, &tokens);
        out.push(hit);
    }
    Ok(())
}

fn direction_of(args: &Value) -> AgramaResult<TraversalDirection> {
    match optional_str(args, "direction").unwrap_or("forward") {
        "forward" => Ok(TraversalDirection::Forward),
        "reverse" => Ok(TraversalDirection::Reverse),
        "bidirectional" => Ok(TraversalDirection::Bidirectional),
        other => Err(ValidationError::MalformedArgument {
            name: "direction".to_string(),
            reason: format!("unknown direction {other:?}"),
        }
        .into()),
    }
}

fn embed_cached(ctx: &PrimitiveContext<'_>, text: &str) -> AgramaResult<Vec<f32>> {
    let key = blake3::hash(text.as_bytes()).to_hex().to_string();
    if let Some(v) = ctx.caches().embedding(&key) {
        return Ok(v);
    }
    let v = ctx.embedder().embed(text)?;
    ctx.caches().store_embedding(key, v.clone());
    Ok(v)
}

fn snippet_for(ctx: &PrimitiveContext<'_>, id: NodeId, tokens: &[String]) -> Option<String> {
    let name = ctx.name_of(id)?;
    let bytes = ctx.content().get(&name).ok()?;
    let text = std::str::from_utf8(&bytes).ok()?;
    extract_snippet(text, tokens)
}

/// Hits → wire form, resolving node names where known.
fn render(ctx: &PrimitiveContext<'_>, hits: &[SearchHit]) -> Value {
    Value::Array(
        hits.iter()
            .map(|h| {
                json!({
                    "id": h.id.to_string(),
                    "name": ctx.name_of(h.id),
                    "score": h.score,
                    "snippet": h.snippet,
                    "components": {
                        "lexical": h.components.lexical,
                        "semantic": h.components.semantic,
                        "graph": h.components.graph,
                    },
                })
            })
            .collect(),
    )
}
