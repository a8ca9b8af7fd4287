//! 待撮合请求注册表
//!
//! 车辆类别到请求队列的映射，插入顺序即先来先得。显式持有、由锁保护，
//! 通过引用传入协调器，不是全局状态。
//!
//! 不变式：一个乘客同一时刻最多出现在一个队列里；一条请求恰好被移除
//! 一次（取消 xor 被选中）。

use std::collections::{HashMap, VecDeque};

use domain::{DomainError, DomainResult, RideRequest, UserId, VehicleClass};
use tokio::sync::Mutex;

/// 所有队列共用一把锁：enqueue/dequeue/peek 彼此原子，
/// 队列移除就是撮合竞争的提交点。
#[derive(Default)]
pub struct PendingRequestRegistry {
    queues: Mutex<HashMap<VehicleClass, VecDeque<RideRequest>>>,
}

impl PendingRequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加到对应车类的队尾。该乘客已有待撮合请求时拒绝。
    pub async fn enqueue(&self, request: RideRequest) -> DomainResult<()> {
        let mut queues = self.queues.lock().await;
        let already_queued = queues
            .values()
            .flatten()
            .any(|pending| pending.rider_id == request.rider_id);
        if already_queued {
            return Err(DomainError::AlreadyQueued);
        }
        queues
            .entry(request.vehicle_class.clone())
            .or_default()
            .push_back(request);
        Ok(())
    }

    /// 移除并返回该车类队列中第一条匹配乘客的请求。
    pub async fn dequeue(
        &self,
        vehicle_class: &VehicleClass,
        rider_id: UserId,
    ) -> DomainResult<RideRequest> {
        let mut queues = self.queues.lock().await;
        let queue = queues
            .get_mut(vehicle_class)
            .ok_or_else(|| DomainError::not_found("ride request"))?;
        let position = queue
            .iter()
            .position(|pending| pending.rider_id == rider_id)
            .ok_or_else(|| DomainError::not_found("ride request"))?;
        // position 来自同一把锁下的查找，remove 必然命中
        Ok(queue.remove(position).expect("position is in bounds"))
    }

    /// 该车类当前待撮合请求的只读快照，给司机展示。
    pub async fn peek_all(&self, vehicle_class: &VehicleClass) -> Vec<RideRequest> {
        let queues = self.queues.lock().await;
        queues
            .get(vehicle_class)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 取消扫描：遍历 (车类, 队列) 对，移除该乘客的第一条请求。
    /// 没有命中时返回 None，调用方按无操作处理。
    pub async fn remove_by_rider(&self, rider_id: UserId) -> Option<RideRequest> {
        let mut queues = self.queues.lock().await;
        for queue in queues.values_mut() {
            if let Some(position) = queue
                .iter()
                .position(|pending| pending.rider_id == rider_id)
            {
                return queue.remove(position);
            }
        }
        None
    }
}
