use super::backend::{check_count, check_root, CommElem, Communicator, ReduceOp, Reducible};
use crate::error::{MatrixError, Result};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

type Packet = Box<dyn Any + Send>;

static NEXT_GROUP: AtomicUsize = AtomicUsize::new(1);

/// One simulated process of a [`ThreadWorld`].
///
/// Processes are connected by a full mesh of unbounded `crossbeam`
/// channels, one per ordered pair, so messages between two processes stay
/// in FIFO order. Payloads are typed `Vec<T>` boxed as `dyn Any`; a type
/// mismatch between sender and receiver is reported as
/// [`MatrixError::Communication`].
///
/// Dropping a `ThreadComm` hangs up its outgoing channels: peers still
/// waiting on it get an error instead of blocking forever.
pub struct ThreadComm {
    rank: usize,
    size: usize,
    group: usize,
    outboxes: Vec<Sender<Packet>>,
    inboxes: Vec<Receiver<Packet>>,
}

impl ThreadComm {
    fn send_to<T: CommElem>(&self, peer: usize, data: Vec<T>) -> Result<()> {
        self.outboxes[peer].send(Box::new(data)).map_err(|_| {
            MatrixError::Communication(format!("rank {} hung up (send from {})", peer, self.rank))
        })
    }

    fn recv_from<T: CommElem>(&self, peer: usize) -> Result<Vec<T>> {
        let packet = self.inboxes[peer].recv().map_err(|_| {
            MatrixError::Communication(format!("rank {} hung up (recv on {})", peer, self.rank))
        })?;
        packet.downcast::<Vec<T>>().map(|data| *data).map_err(|_| {
            MatrixError::Communication(format!(
                "rank {} sent an unexpected element type to rank {}",
                peer, self.rank
            ))
        })
    }

    fn peers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).filter(move |&peer| peer != self.rank)
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn group_id(&self) -> usize {
        self.group
    }

    fn broadcast<T: CommElem>(&self, buf: &mut [T], root: usize) -> Result<()> {
        check_root(root, self.size)?;
        if self.rank == root {
            for peer in self.peers() {
                self.send_to(peer, buf.to_vec())?;
            }
        } else {
            let data: Vec<T> = self.recv_from(root)?;
            check_count("broadcast", data.len(), buf.len())?;
            buf.copy_from_slice(&data);
        }
        Ok(())
    }

    fn all_gather<T: CommElem>(&self, send: &[T], recv: &mut [T]) -> Result<()> {
        let block = send.len();
        check_count("recv", recv.len(), block * self.size)?;
        for peer in self.peers() {
            self.send_to(peer, send.to_vec())?;
        }
        recv[self.rank * block..(self.rank + 1) * block].copy_from_slice(send);
        for peer in self.peers() {
            let data: Vec<T> = self.recv_from(peer)?;
            check_count("all_gather", data.len(), block)?;
            recv[peer * block..(peer + 1) * block].copy_from_slice(&data);
        }
        trace!(rank = self.rank, block, "all_gather done");
        Ok(())
    }

    fn gather<T: CommElem>(&self, send: &[T], recv: &mut [T], root: usize) -> Result<()> {
        check_root(root, self.size)?;
        if self.rank != root {
            return self.send_to(root, send.to_vec());
        }

        let block = send.len();
        check_count("recv", recv.len(), block * self.size)?;
        recv[root * block..(root + 1) * block].copy_from_slice(send);
        for peer in self.peers() {
            let data: Vec<T> = self.recv_from(peer)?;
            check_count("gather", data.len(), block)?;
            recv[peer * block..(peer + 1) * block].copy_from_slice(&data);
        }
        Ok(())
    }

    /// Ring all-reduce.
    ///
    /// The buffer is cut into `size` chunks. In the scatter-reduce phase
    /// every process passes one chunk to its right neighbour per step and
    /// folds the chunk coming from its left neighbour into its own copy.
    /// After `size - 1` steps each process owns one fully reduced chunk,
    /// which the all-gather phase then circulates around the ring.
    ///
    /// Every chunk is reduced by exactly one process and copied to the
    /// others, so all processes end up with bitwise identical results.
    fn all_reduce<T: Reducible>(&self, send: &[T], recv: &mut [T], op: ReduceOp) -> Result<()> {
        check_count("recv", recv.len(), send.len())?;
        recv.copy_from_slice(send);

        let n = self.size;
        if n == 1 {
            return Ok(());
        }

        let total = recv.len();
        let chunk = total.div_ceil(n);
        let span = |idx: usize| {
            let start = (idx * chunk).min(total);
            start..(start + chunk).min(total)
        };
        let right = (self.rank + 1) % n;
        let left = (self.rank + n - 1) % n;

        // --- Phase 1: Scatter-Reduce ---
        for step in 0..n - 1 {
            let send_idx = (self.rank + n - step) % n;
            let recv_idx = (self.rank + 2 * n - step - 1) % n;

            self.send_to(right, recv[span(send_idx)].to_vec())?;
            let incoming: Vec<T> = self.recv_from(left)?;
            let range = span(recv_idx);
            check_count("all_reduce", incoming.len(), range.len())?;
            for (acc, val) in recv[range].iter_mut().zip(incoming) {
                *acc = op.apply(*acc, val);
            }
        }

        // --- Phase 2: All-Gather ---
        for step in 0..n - 1 {
            let send_idx = (self.rank + n + 1 - step) % n;
            let recv_idx = (self.rank + n - step) % n;

            self.send_to(right, recv[span(send_idx)].to_vec())?;
            let incoming: Vec<T> = self.recv_from(left)?;
            let range = span(recv_idx);
            check_count("all_reduce", incoming.len(), range.len())?;
            recv[range].copy_from_slice(&incoming);
        }
        Ok(())
    }

    fn barrier(&self) -> Result<()> {
        for peer in self.peers() {
            self.send_to::<u8>(peer, Vec::new())?;
        }
        for peer in self.peers() {
            self.recv_from::<u8>(peer)?;
        }
        Ok(())
    }
}

/// A group of `size` simulated processes.
///
/// ```
/// use parmat::comm::{Communicator, ThreadWorld};
///
/// let ranks = ThreadWorld::run(3, |comm| comm.rank());
/// assert_eq!(ranks, vec![0, 1, 2]);
/// ```
pub struct ThreadWorld {
    comms: Vec<ThreadComm>,
}

impl ThreadWorld {
    /// Wires up a new group.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "a process group needs at least one process");
        let group = NEXT_GROUP.fetch_add(1, Ordering::Relaxed);

        let mut outboxes: Vec<Vec<Sender<Packet>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut inboxes: Vec<Vec<Receiver<Packet>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        for outbox in outboxes.iter_mut() {
            for inbox in inboxes.iter_mut() {
                let (tx, rx) = unbounded();
                outbox.push(tx);
                inbox.push(rx);
            }
        }

        let comms = outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| ThreadComm {
                rank,
                size,
                group,
                outboxes,
                inboxes,
            })
            .collect();
        Self { comms }
    }

    pub fn size(&self) -> usize {
        self.comms.len()
    }

    /// Hands out the per-rank communicators, in rank order.
    pub fn into_comms(self) -> Vec<ThreadComm> {
        self.comms
    }

    /// Runs `f` once per process, each on its own thread, and collects the
    /// results in rank order.
    ///
    /// A panic on any process is re-raised on the caller once all threads
    /// have finished.
    pub fn run<R, F>(size: usize, f: F) -> Vec<R>
    where
        F: Fn(&ThreadComm) -> R + Sync,
        R: Send,
    {
        let world = ThreadWorld::new(size);
        std::thread::scope(|scope| {
            let handles: Vec<_> = world
                .into_comms()
                .into_iter()
                .map(|comm| {
                    let f = &f;
                    scope.spawn(move || f(&comm))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_gather() {
        let results = ThreadWorld::run(4, |comm| {
            let send = [comm.rank() as f64, 10.0 * comm.rank() as f64];
            let mut recv = [0.0; 8];
            comm.all_gather(&send, &mut recv).unwrap();
            recv
        });
        for recv in results {
            assert_eq!(recv, [0.0, 0.0, 1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);
        }
    }

    #[test]
    fn test_gather_only_fills_root() {
        let results = ThreadWorld::run(3, |comm| {
            let mut recv = [0u64; 3];
            comm.gather(&[comm.rank() as u64 + 1], &mut recv, 1).unwrap();
            recv
        });
        assert_eq!(results[0], [0, 0, 0]);
        assert_eq!(results[1], [1, 2, 3]);
        assert_eq!(results[2], [0, 0, 0]);
    }

    #[test]
    fn test_broadcast() {
        let results = ThreadWorld::run(4, |comm| {
            let mut buf = [comm.rank() as i64; 2];
            comm.broadcast(&mut buf, 2).unwrap();
            buf
        });
        assert!(results.iter().all(|buf| *buf == [2, 2]));
    }

    #[test]
    fn test_ring_all_reduce() {
        // 3 elements over 4 ranks leaves the last ring chunk empty.
        let results = ThreadWorld::run(4, |comm| {
            let r = comm.rank() as f64;
            let send = [r + 1.0, -r, 0.5 * r];
            let mut sum = [0.0; 3];
            comm.all_reduce(&send, &mut sum, ReduceOp::Sum).unwrap();
            let mut max = [0.0; 3];
            comm.all_reduce(&send, &mut max, ReduceOp::Max).unwrap();
            (sum, max)
        });
        for (sum, max) in results {
            assert_eq!(sum, [10.0, -6.0, 3.0]);
            assert_eq!(max, [4.0, 0.0, 1.5]);
        }
    }

    #[test]
    fn test_barrier_and_groups() {
        let ids = ThreadWorld::run(3, |comm| {
            comm.barrier().unwrap();
            comm.group_id()
        });
        assert!(ids.iter().all(|&id| id == ids[0]));

        let other = ThreadWorld::new(1).into_comms();
        assert_ne!(other[0].group_id(), ids[0]);
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let results = ThreadWorld::run(2, |comm| {
            if comm.rank() == 0 {
                comm.all_gather(&[1.0f64], &mut [0.0; 2]).is_err()
            } else {
                comm.all_gather(&[1u64], &mut [0; 2]).is_err()
            }
        });
        assert_eq!(results, vec![true, true]);
    }

    #[test]
    #[should_panic(expected = "rank 1 failed")]
    fn test_panic_does_not_deadlock_peers() {
        ThreadWorld::run(2, |comm| {
            if comm.rank() == 1 {
                panic!("rank 1 failed");
            }
            let mut recv = [0.0; 2];
            assert!(comm.all_gather(&[0.0], &mut recv).is_err());
        });
    }
}
