#[inline]
pub fn id() -> usize {
    __get_id()
}

#[cfg(unix)]
#[inline]
fn __get_id() -> usize {
    unsafe { libc::pthread_self() as usize }
}

#[cfg(not(all(unix)))]
#[inline]
fn __get_id() -> usize {
    0
}
