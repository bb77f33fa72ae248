//! Adapter from an MPI communicator to [`Communicator`].
//!
//! ```no_run
//! use parmat::comm::MpiComm;
//!
//! let universe = mpi::initialize().unwrap();
//! let comm = MpiComm::new(universe.world());
//! ```

use super::backend::{check_count, check_root, CommElem, Communicator, ReduceOp, Reducible};
use crate::error::Result;
use mpi::collective::SystemOperation;
use mpi::raw::AsRaw;
use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator as _, CommunicatorCollectives, Root};

pub struct MpiComm {
    world: SimpleCommunicator,
}

impl MpiComm {
    pub fn new(world: SimpleCommunicator) -> Self {
        Self { world }
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn group_id(&self) -> usize {
        self.world.as_raw() as usize
    }

    fn broadcast<T: CommElem>(&self, buf: &mut [T], root: usize) -> Result<()> {
        check_root(root, self.size())?;
        self.world.process_at_rank(root as i32).broadcast_into(buf);
        Ok(())
    }

    fn all_gather<T: CommElem>(&self, send: &[T], recv: &mut [T]) -> Result<()> {
        check_count("recv", recv.len(), send.len() * self.size())?;
        self.world.all_gather_into(send, recv);
        Ok(())
    }

    fn gather<T: CommElem>(&self, send: &[T], recv: &mut [T], root: usize) -> Result<()> {
        check_root(root, self.size())?;
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank() == root {
            check_count("recv", recv.len(), send.len() * self.size())?;
            root_process.gather_into_root(send, recv);
        } else {
            root_process.gather_into(send);
        }
        Ok(())
    }

    fn all_reduce<T: Reducible>(&self, send: &[T], recv: &mut [T], op: ReduceOp) -> Result<()> {
        check_count("recv", recv.len(), send.len())?;
        let op = match op {
            ReduceOp::Sum => SystemOperation::sum(),
            ReduceOp::Product => SystemOperation::product(),
            ReduceOp::Max => SystemOperation::max(),
            ReduceOp::Min => SystemOperation::min(),
        };
        self.world.all_reduce_into(send, recv, op);
        Ok(())
    }

    fn barrier(&self) -> Result<()> {
        self.world.barrier();
        Ok(())
    }
}
