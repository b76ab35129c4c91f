//! C FFI for a host renderer.
//!
//! Functions:
//! - `mr_world_create` / `mr_world_free` - build a world from TOML
//! - `mr_world_spawn`, `mr_world_step`, `mr_world_reset` - drive the simulation
//! - `mr_world_marbles` - per-marble render state
//! - `mr_track_colliders`, `mr_track_frames` - static track geometry
//!
//! # Error Codes
//! - `0`: Success
//! - `-1`: Null pointer
//! - `-2`: Invalid configuration
//! - `-3`: Buffer overflow (count holds the required size; resize and retry)

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::RunConfig;
use crate::sim::MarbleState;
use crate::track::{ColliderSegment, SplinePoint};
use crate::world::World;

/// World plus the random source used for spawning.
pub struct MrWorld {
    world: World,
    rng: StdRng,
}

/// Opaque handle to a world.
pub type MrWorldHandle = *mut std::ffi::c_void;

/// Build a world from a TOML run configuration.
///
/// A null `toml` with `len == 0` uses the default configuration.
///
/// # Returns
/// - Valid handle on success (non-null), `status` set to `0`
/// - Null on error, `status` set to `-2`
///
/// # Safety
/// - `toml` must point to at least `len` readable bytes, or be null with `len == 0`
/// - `status` must be a valid pointer or null
#[no_mangle]
pub unsafe extern "C" fn mr_world_create(
    toml: *const u8,
    len: usize,
    seed: u64,
    status: *mut i32,
) -> MrWorldHandle {
    let result = if toml.is_null() || len == 0 {
        Ok(RunConfig::default())
    } else {
        let bytes = std::slice::from_raw_parts(toml, len);
        match std::str::from_utf8(bytes) {
            Ok(text) => RunConfig::from_toml_str(text),
            Err(_) => {
                set_status(status, -2);
                return std::ptr::null_mut();
            }
        }
    };

    match result.and_then(|config| World::from_config(&config)) {
        Ok(world) => {
            set_status(status, 0);
            let handle = MrWorld {
                world,
                rng: StdRng::seed_from_u64(seed),
            };
            Box::into_raw(Box::new(handle)) as MrWorldHandle
        }
        Err(err) => {
            log::warn!("mr_world_create: {err}");
            set_status(status, -2);
            std::ptr::null_mut()
        }
    }
}

/// Free a world handle.
///
/// # Safety
/// - `handle` must be a valid handle returned by `mr_world_create`, or null
#[no_mangle]
pub unsafe extern "C" fn mr_world_free(handle: MrWorldHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle as *mut MrWorld));
    }
}

/// Drop a new marble at the track start.
///
/// # Safety
/// - `handle` must be a valid world handle
/// - `out_id` must be a valid pointer or null
#[no_mangle]
pub unsafe extern "C" fn mr_world_spawn(handle: MrWorldHandle, out_id: *mut u32) -> i32 {
    let Some(state) = world_mut(handle) else {
        return -1;
    };
    let id = state.world.spawn(&mut state.rng);
    if !out_id.is_null() {
        *out_id = id;
    }
    0
}

/// Advance the simulation by `frame_dt` seconds.
///
/// # Safety
/// - `handle` must be a valid world handle
#[no_mangle]
pub unsafe extern "C" fn mr_world_step(handle: MrWorldHandle, frame_dt: f32) -> i32 {
    let Some(state) = world_mut(handle) else {
        return -1;
    };
    state.world.step(frame_dt);
    0
}

/// Remove all marbles and restart the race clock.
///
/// # Safety
/// - `handle` must be a valid world handle
#[no_mangle]
pub unsafe extern "C" fn mr_world_reset(handle: MrWorldHandle) -> i32 {
    let Some(state) = world_mut(handle) else {
        return -1;
    };
    state.world.reset();
    0
}

/// Race time in seconds, or a negative value for a null handle.
///
/// # Safety
/// - `handle` must be a valid world handle or null
#[no_mangle]
pub unsafe extern "C" fn mr_world_time(handle: MrWorldHandle) -> f32 {
    match world_ref(handle) {
        Some(state) => state.world.time(),
        None => -1.0,
    }
}

/// Copy per-marble render state.
///
/// # Safety
/// - `handle` must be a valid world handle
/// - `out` must point to a buffer of at least `capacity` elements
/// - `count` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn mr_world_marbles(
    handle: MrWorldHandle,
    out: *mut MarbleState,
    capacity: usize,
    count: *mut usize,
) -> i32 {
    let Some(state) = world_ref(handle) else {
        return -1;
    };
    write_items(&state.world.snapshot(), out, capacity, count)
}

/// Copy the static box colliders of the track.
///
/// # Safety
/// - `handle` must be a valid world handle
/// - `out` must point to a buffer of at least `capacity` elements
/// - `count` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn mr_track_colliders(
    handle: MrWorldHandle,
    out: *mut ColliderSegment,
    capacity: usize,
    count: *mut usize,
) -> i32 {
    let Some(state) = world_ref(handle) else {
        return -1;
    };
    write_items(state.world.track().colliders(), out, capacity, count)
}

/// Copy the track frames, for building the visual mesh.
///
/// # Safety
/// - `handle` must be a valid world handle
/// - `out` must point to a buffer of at least `capacity` elements
/// - `count` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn mr_track_frames(
    handle: MrWorldHandle,
    out: *mut SplinePoint,
    capacity: usize,
    count: *mut usize,
) -> i32 {
    let Some(state) = world_ref(handle) else {
        return -1;
    };
    write_items(state.world.track().frames(), out, capacity, count)
}

// --- Helpers ---

unsafe fn world_ref<'a>(handle: MrWorldHandle) -> Option<&'a MrWorld> {
    (handle as *const MrWorld).as_ref()
}

unsafe fn world_mut<'a>(handle: MrWorldHandle) -> Option<&'a mut MrWorld> {
    (handle as *mut MrWorld).as_mut()
}

unsafe fn set_status(status: *mut i32, code: i32) {
    if !status.is_null() {
        *status = code;
    }
}

unsafe fn write_items<T: Copy>(items: &[T], out: *mut T, capacity: usize, count: *mut usize) -> i32 {
    if count.is_null() {
        return -1;
    }
    *count = items.len();
    if items.is_empty() {
        return 0;
    }
    if out.is_null() {
        return -1;
    }
    if items.len() > capacity {
        return -3;
    }
    std::ptr::copy_nonoverlapping(items.as_ptr(), out, items.len());
    0
}
