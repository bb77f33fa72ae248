use super::backend::{check_count, check_root, CommElem, Communicator, ReduceOp, Reducible};
use crate::error::Result;

/// Communicator of a world with exactly one process.
///
/// All collectives degenerate to copies. Every `SelfComm` belongs to the
/// same group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelfComm;

impl SelfComm {
    pub fn new() -> Self {
        SelfComm
    }
}

impl Communicator for SelfComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn group_id(&self) -> usize {
        0
    }

    fn broadcast<T: CommElem>(&self, _buf: &mut [T], root: usize) -> Result<()> {
        check_root(root, 1)
    }

    fn all_gather<T: CommElem>(&self, send: &[T], recv: &mut [T]) -> Result<()> {
        check_count("recv", recv.len(), send.len())?;
        recv.copy_from_slice(send);
        Ok(())
    }

    fn gather<T: CommElem>(&self, send: &[T], recv: &mut [T], root: usize) -> Result<()> {
        check_root(root, 1)?;
        self.all_gather(send, recv)
    }

    fn all_reduce<T: Reducible>(&self, send: &[T], recv: &mut [T], _op: ReduceOp) -> Result<()> {
        self.all_gather(send, recv)
    }

    fn barrier(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_comm_copies() {
        let comm = SelfComm::new();
        assert_eq!((comm.rank(), comm.size()), (0, 1));

        let mut recv = [0.0; 3];
        comm.all_gather(&[1.0, 2.0, 3.0], &mut recv).unwrap();
        assert_eq!(recv, [1.0, 2.0, 3.0]);

        let mut reduced = [0u64; 2];
        comm.all_reduce(&[4, 5], &mut reduced, ReduceOp::Max).unwrap();
        assert_eq!(reduced, [4, 5]);

        let mut buf = [9i32];
        comm.broadcast(&mut buf, 0).unwrap();
        assert_eq!(buf, [9]);
        assert!(comm.broadcast(&mut buf, 1).is_err());
        assert!(comm.all_gather(&[1.0], &mut [0.0; 2]).is_err());
    }
}
