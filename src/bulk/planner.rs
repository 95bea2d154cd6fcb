use crate::bulk::Chunk;
use crate::error::Error;

/// Split `items` into ordered chunks of at most `ceiling` items
///
/// Produces `ceil(n / ceiling)` chunks; every chunk is full except possibly the last.
/// An empty input yields no chunks. Concatenating the chunks in order gives back the
/// input exactly.
///
/// # Errors
///
/// Returns [`Error::InvalidCeiling`] when `ceiling` is zero.
pub fn plan_chunks<U>(items: Vec<U>, ceiling: usize) -> Result<Vec<Chunk<U>>, Error> {
    if ceiling == 0 {
        return Err(Error::InvalidCeiling);
    }

    let mut chunks = Vec::with_capacity(items.len().div_ceil(ceiling));
    let mut rest = items.into_iter().peekable();

    while rest.peek().is_some() {
        let items: Vec<U> = rest.by_ref().take(ceiling).collect();
        chunks.push(Chunk {
            index: chunks.len(),
            items,
        });
    }

    Ok(chunks)
}
