// implemented by anything holding a channel subscription that captures itself;
// call before dropping to break the Rc cycle
pub trait Destroyable {
    fn destroy(&mut self);
}
