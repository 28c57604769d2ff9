//! Stable C ABI over the `rect-rank` engine.
//!
//! Three symbols: `create` builds an engine over a half-open range of
//! points, `search` runs one top-k rectangle query, `destroy` releases the
//! engine. The handle is opaque; callers never see its layout. `Point` and
//! `Rect` are `#[repr(C)]` in the core crate, so caller buffers cross the
//! boundary untouched.
//!
//! Every pointer is checked before use: a null or backwards range builds a
//! valid empty engine, and a null handle or output buffer makes `search`
//! report zero results rather than fault.

use std::ptr;
use std::slice;

use rect_rank::{Point, RankIndex, Rect, Search};

/// Opaque engine handle handed across the ABI.
pub struct SearchContext {
    index: RankIndex,
}

/// Build an engine over the points in `[points_begin, points_end)`.
///
/// # Safety
///
/// If non-null and ordered, the pointers must delimit a readable array of
/// `Point` records within one allocation.
#[no_mangle]
pub unsafe extern "C" fn create(
    points_begin: *const Point,
    points_end: *const Point,
) -> *mut SearchContext {
    let points = if points_begin.is_null() || points_end.is_null() {
        &[][..]
    } else {
        let len = points_end.offset_from(points_begin);
        if len <= 0 {
            &[][..]
        } else {
            slice::from_raw_parts(points_begin, len as usize)
        }
    };

    Box::into_raw(Box::new(SearchContext {
        index: RankIndex::new(points),
    }))
}

/// Run one query: fill `out_points` with up to `count` points inside
/// `rect`, lowest rank first, and return the number written.
///
/// # Safety
///
/// `sc` must be a handle from [`create`] that has not been destroyed, and
/// `out_points` must have room for `count` records.
#[no_mangle]
pub unsafe extern "C" fn search(
    sc: *const SearchContext,
    rect: Rect,
    count: i32,
    out_points: *mut Point,
) -> i32 {
    let sc = match sc.as_ref() {
        Some(sc) => sc,
        None => return 0,
    };
    if count <= 0 || out_points.is_null() {
        return 0;
    }

    let mut scratch = Search::default();
    let mut written = 0;
    for point in sc.index.search(&rect, count as usize, &mut scratch) {
        *out_points.add(written) = *point;
        written += 1;
    }
    written as i32
}

/// Release an engine. Always returns null so callers can overwrite their
/// handle in one statement.
///
/// # Safety
///
/// `sc` must be null or a handle from [`create`] that has not already been
/// destroyed.
#[no_mangle]
pub unsafe extern "C" fn destroy(sc: *mut SearchContext) -> *mut SearchContext {
    if !sc.is_null() {
        drop(Box::from_raw(sc));
    }
    ptr::null_mut()
}
