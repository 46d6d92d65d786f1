/// Largest side of a model after it is fitted to the stage, in world units.
/// Lights and the orbit camera are placed for a model of this size.
pub const MODEL_FIT_SIZE: f32 = 1.0;
