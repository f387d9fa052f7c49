/// Alert Priority Queue
///
/// Bounded visible set of toasts backed by a pending heap.
/// Supports:
/// - Immediate display while toast slots are free
/// - Priority-ordered release (critical first), FIFO within a priority
/// - Banners (persistent alerts) that bypass the toast capacity
/// - Runtime capacity changes
/// - Metrics collection

use crate::models::{Alert, AlertId, AlertStatus, DEFAULT_MAX_TOASTS};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Alert waiting for a toast slot
#[derive(Debug, Clone)]
struct PendingAlert {
    alert: Alert,
    /// Insertion sequence, used for FIFO ordering within a priority
    seq: u64,
}

impl PendingAlert {
    fn key(&self) -> (u8, u64) {
        (self.alert.priority.rank(), self.seq)
    }
}

impl Eq for PendingAlert {}

impl PartialEq for PendingAlert {
    fn eq(&self, other: &Self) -> bool {
        self.alert.id == other.alert.id
    }
}

impl Ord for PendingAlert {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lowest rank, then oldest sequence, is the heap maximum
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for PendingAlert {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
struct VisibleAlert {
    alert: Alert,
    seq: u64,
}

/// Where an enqueued alert ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Shown,
    Queued,
}

/// Result of a capacity change
#[derive(Debug, Clone, Default)]
pub struct CapacityChange {
    /// Pending alerts that became visible
    pub promoted: Vec<Alert>,
    /// Visible toasts moved back to pending
    pub demoted: Vec<Alert>,
}

/// Metrics for queue monitoring
#[derive(Debug, Clone, Default)]
pub struct QueueMetrics {
    pub total_enqueued: usize,
    pub total_shown: usize,
    pub total_queued: usize,
    pub total_released: usize,
    pub peak_pending: usize,
}

/// Priority queue for alerts
#[derive(Debug)]
pub struct AlertQueue {
    visible: Vec<VisibleAlert>,
    pending: BinaryHeap<PendingAlert>,
    max_visible: usize,
    next_seq: u64,
    metrics: QueueMetrics,
}

impl AlertQueue {
    /// Create a queue holding at most `max_visible` toasts (minimum 1)
    pub fn new(max_visible: usize) -> Self {
        Self {
            visible: Vec::new(),
            pending: BinaryHeap::new(),
            max_visible: max_visible.max(1),
            next_seq: 0,
            metrics: QueueMetrics::default(),
        }
    }

    /// Enqueue an alert, showing it right away when a slot is free
    pub fn enqueue(&mut self, mut alert: Alert) -> Placement {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.metrics.total_enqueued += 1;

        if alert.is_persistent() || self.toast_count() < self.max_visible {
            alert.status = AlertStatus::Visible;
            self.visible.push(VisibleAlert { alert, seq });
            self.metrics.total_shown += 1;
            Placement::Shown
        } else {
            alert.status = AlertStatus::Queued;
            self.pending.push(PendingAlert { alert, seq });
            self.metrics.total_queued += 1;
            self.metrics.peak_pending = self.metrics.peak_pending.max(self.pending.len());
            Placement::Queued
        }
    }

    /// Promote the highest-priority pending alert if a toast slot is free
    pub fn release(&mut self) -> Option<Alert> {
        if self.toast_count() >= self.max_visible {
            return None;
        }

        let PendingAlert { mut alert, seq } = self.pending.pop()?;
        alert.status = AlertStatus::Visible;
        self.visible.push(VisibleAlert {
            alert: alert.clone(),
            seq,
        });
        self.metrics.total_released += 1;
        Some(alert)
    }

    /// Promote pending alerts until the toast slots are full
    pub fn release_all(&mut self) -> Vec<Alert> {
        let mut promoted = Vec::new();
        while let Some(alert) = self.release() {
            promoted.push(alert);
        }
        promoted
    }

    /// Remove an alert from either the visible set or the pending heap
    pub fn remove(&mut self, id: AlertId) -> Option<Alert> {
        if let Some(index) = self.visible.iter().position(|v| v.alert.id == id) {
            return Some(self.visible.remove(index).alert);
        }

        let mut removed = None;
        self.pending.retain(|p| {
            if p.alert.id == id {
                removed = Some(p.alert.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Change the toast capacity
    ///
    /// Shrinking moves the most recently shown toasts back to pending.
    pub fn set_capacity(&mut self, max_visible: usize) -> CapacityChange {
        self.max_visible = max_visible.max(1);

        let mut demoted = Vec::new();
        while self.toast_count() > self.max_visible {
            let Some(index) = self.visible.iter().rposition(|v| !v.alert.is_persistent()) else {
                break;
            };
            let VisibleAlert { mut alert, seq } = self.visible.remove(index);
            alert.status = AlertStatus::Queued;
            demoted.push(alert.clone());
            self.pending.push(PendingAlert { alert, seq });
        }
        self.metrics.peak_pending = self.metrics.peak_pending.max(self.pending.len());

        CapacityChange {
            promoted: self.release_all(),
            demoted,
        }
    }

    /// Mark one alert as read; returns false for unknown ids
    pub fn mark_read(&mut self, id: AlertId) -> bool {
        if let Some(visible) = self.visible.iter_mut().find(|v| v.alert.id == id) {
            visible.alert.read = true;
            return true;
        }

        let mut items = std::mem::take(&mut self.pending).into_vec();
        let found = match items.iter_mut().find(|p| p.alert.id == id) {
            Some(pending) => {
                pending.alert.read = true;
                true
            }
            None => false,
        };
        self.pending = BinaryHeap::from(items);
        found
    }

    /// Mark every alert as read; returns how many changed
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for visible in self.visible.iter_mut().filter(|v| !v.alert.read) {
            visible.alert.read = true;
            changed += 1;
        }

        let mut items = std::mem::take(&mut self.pending).into_vec();
        for pending in items.iter_mut().filter(|p| !p.alert.read) {
            pending.alert.read = true;
            changed += 1;
        }
        self.pending = BinaryHeap::from(items);
        changed
    }

    /// Empty both sets, returning everything that was held
    pub fn clear(&mut self) -> Vec<Alert> {
        let mut cleared: Vec<Alert> = self.visible.drain(..).map(|v| v.alert).collect();
        cleared.extend(self.pending.drain().map(|p| p.alert));
        cleared
    }

    pub fn get(&self, id: AlertId) -> Option<&Alert> {
        self.visible
            .iter()
            .map(|v| &v.alert)
            .chain(self.pending.iter().map(|p| &p.alert))
            .find(|a| a.id == id)
    }

    /// Visible alerts in the order they were shown
    pub fn visible(&self) -> Vec<Alert> {
        self.visible.iter().map(|v| v.alert.clone()).collect()
    }

    /// Pending alerts in release order
    pub fn pending(&self) -> Vec<Alert> {
        let mut items = self.pending.clone().into_sorted_vec();
        items.reverse();
        items.into_iter().map(|p| p.alert).collect()
    }

    /// Number of visible non-persistent alerts
    pub fn toast_count(&self) -> usize {
        self.visible
            .iter()
            .filter(|v| !v.alert.is_persistent())
            .count()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.visible.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty() && self.pending.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_visible
    }

    pub fn metrics(&self) -> &QueueMetrics {
        &self.metrics
    }
}

impl Default for AlertQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOASTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertPriority, AlertSettings, NewAlert};

    fn alert(title: &str, priority: AlertPriority) -> Alert {
        NewAlert::new(title)
            .priority(priority)
            .into_alert(&AlertSettings::default())
    }

    fn banner(title: &str) -> Alert {
        NewAlert::new(title)
            .persistent()
            .into_alert(&AlertSettings::default())
    }

    fn titles(alerts: &[Alert]) -> Vec<&str> {
        alerts.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn test_pending_ordering() {
        let low = PendingAlert {
            alert: alert("low", AlertPriority::Low),
            seq: 0,
        };
        let critical = PendingAlert {
            alert: alert("critical", AlertPriority::Critical),
            seq: 1,
        };
        assert!(critical > low);

        let older = PendingAlert {
            alert: alert("a", AlertPriority::High),
            seq: 2,
        };
        let newer = PendingAlert {
            alert: alert("b", AlertPriority::High),
            seq: 3,
        };
        assert!(older > newer);
    }

    #[test]
    fn test_enqueue_shows_until_capacity() {
        let mut queue = AlertQueue::new(2);

        assert_eq!(queue.enqueue(alert("1", AlertPriority::Normal)), Placement::Shown);
        assert_eq!(queue.enqueue(alert("2", AlertPriority::Normal)), Placement::Shown);
        assert_eq!(queue.enqueue(alert("3", AlertPriority::Normal)), Placement::Queued);

        assert_eq!(queue.toast_count(), 2);
        assert_eq!(queue.pending_len(), 1);
        assert_eq!(queue.pending()[0].status, AlertStatus::Queued);
    }

    #[test]
    fn test_critical_jumps_ahead_of_lows() {
        let mut queue = AlertQueue::new(5);
        for i in 0..5 {
            queue.enqueue(alert(&format!("low-{}", i), AlertPriority::Low));
        }
        queue.enqueue(alert("critical", AlertPriority::Critical));
        queue.enqueue(alert("low-5", AlertPriority::Low));

        assert_eq!(
            titles(&queue.visible()),
            vec!["low-0", "low-1", "low-2", "low-3", "low-4"]
        );
        assert_eq!(titles(&queue.pending()), vec!["critical", "low-5"]);

        let first_visible = queue.visible()[2].id;
        queue.remove(first_visible);
        let released = queue.release().unwrap();

        assert_eq!(released.title, "critical");
        assert_eq!(released.status, AlertStatus::Visible);
        assert_eq!(queue.toast_count(), 5);
    }

    #[test]
    fn test_release_order_priority_then_fifo() {
        let mut queue = AlertQueue::new(1);
        queue.enqueue(alert("blocker", AlertPriority::Low));
        queue.enqueue(alert("normal-a", AlertPriority::Normal));
        queue.enqueue(alert("low-a", AlertPriority::Low));
        queue.enqueue(alert("high-a", AlertPriority::High));
        queue.enqueue(alert("normal-b", AlertPriority::Normal));
        queue.enqueue(alert("critical-a", AlertPriority::Critical));
        queue.enqueue(alert("high-b", AlertPriority::High));

        let mut released = Vec::new();
        while let Some(current) = queue.visible().first().cloned() {
            queue.remove(current.id);
            if let Some(next) = queue.release() {
                released.push(next.title);
            }
        }

        assert_eq!(
            released,
            vec!["critical-a", "high-a", "high-b", "normal-a", "normal-b", "low-a"]
        );
    }

    #[test]
    fn test_release_without_free_slot() {
        let mut queue = AlertQueue::new(1);
        queue.enqueue(alert("1", AlertPriority::Low));
        queue.enqueue(alert("2", AlertPriority::Critical));

        assert!(queue.release().is_none());
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn test_banners_bypass_capacity() {
        let mut queue = AlertQueue::new(1);
        queue.enqueue(alert("toast", AlertPriority::Normal));

        assert_eq!(queue.enqueue(banner("banner-1")), Placement::Shown);
        assert_eq!(queue.enqueue(banner("banner-2")), Placement::Shown);
        assert_eq!(queue.visible_len(), 3);
        assert_eq!(queue.toast_count(), 1);
    }

    #[test]
    fn test_remove_pending() {
        let mut queue = AlertQueue::new(1);
        queue.enqueue(alert("1", AlertPriority::Low));
        let queued = alert("2", AlertPriority::Low);
        let id = queued.id;
        queue.enqueue(queued);

        let removed = queue.remove(id).unwrap();
        assert_eq!(removed.title, "2");
        assert_eq!(queue.pending_len(), 0);
        assert!(queue.remove(id).is_none());
    }

    #[test]
    fn test_capacity_invariant_under_load() {
        let mut queue = AlertQueue::new(3);
        let priorities = [
            AlertPriority::Low,
            AlertPriority::Critical,
            AlertPriority::Normal,
            AlertPriority::High,
        ];

        for i in 0..40 {
            queue.enqueue(alert(&i.to_string(), priorities[i % priorities.len()]));
            assert!(queue.toast_count() <= 3);

            if i % 3 == 0 {
                let id = queue.visible()[0].id;
                queue.remove(id);
                queue.release_all();
                assert!(queue.toast_count() <= 3);
            }
        }
    }

    #[test]
    fn test_shrink_capacity_demotes_newest() {
        let mut queue = AlertQueue::new(3);
        queue.enqueue(alert("a", AlertPriority::Normal));
        queue.enqueue(alert("b", AlertPriority::Normal));
        queue.enqueue(alert("c", AlertPriority::Normal));

        let change = queue.set_capacity(1);

        assert_eq!(titles(&change.demoted), vec!["c", "b"]);
        assert!(change.promoted.is_empty());
        assert_eq!(titles(&queue.visible()), vec!["a"]);
        assert_eq!(titles(&queue.pending()), vec!["b", "c"]);
    }

    #[test]
    fn test_grow_capacity_promotes_pending() {
        let mut queue = AlertQueue::new(1);
        queue.enqueue(alert("a", AlertPriority::Normal));
        queue.enqueue(alert("b", AlertPriority::Low));
        queue.enqueue(alert("c", AlertPriority::High));

        let change = queue.set_capacity(3);

        assert_eq!(titles(&change.promoted), vec!["c", "b"]);
        assert_eq!(queue.pending_len(), 0);
        assert_eq!(queue.capacity(), 3);
    }

    #[test]
    fn test_mark_read() {
        let mut queue = AlertQueue::new(1);
        let visible = alert("visible", AlertPriority::Normal);
        let pending = alert("pending", AlertPriority::Normal);
        let (visible_id, pending_id) = (visible.id, pending.id);
        queue.enqueue(visible);
        queue.enqueue(pending);

        assert!(queue.mark_read(pending_id));
        assert!(queue.get(pending_id).unwrap().read);
        assert!(!queue.get(visible_id).unwrap().read);
        assert!(!queue.mark_read(uuid::Uuid::new_v4()));

        assert_eq!(queue.mark_all_read(), 1);
        assert_eq!(queue.mark_all_read(), 0);
        assert_eq!(queue.visible_len(), 1);
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut queue = AlertQueue::new(1);
        queue.enqueue(alert("1", AlertPriority::Normal));
        queue.enqueue(alert("2", AlertPriority::Normal));
        queue.enqueue(banner("3"));

        let cleared = queue.clear();
        assert_eq!(cleared.len(), 3);
        assert!(queue.is_empty());
        assert_eq!(queue.toast_count(), 0);
    }

    #[test]
    fn test_metrics() {
        let mut queue = AlertQueue::new(1);
        queue.enqueue(alert("1", AlertPriority::Normal));
        queue.enqueue(alert("2", AlertPriority::Normal));
        queue.enqueue(alert("3", AlertPriority::Normal));

        let id = queue.visible()[0].id;
        queue.remove(id);
        queue.release();

        let metrics = queue.metrics();
        assert_eq!(metrics.total_enqueued, 3);
        assert_eq!(metrics.total_shown, 1);
        assert_eq!(metrics.total_queued, 2);
        assert_eq!(metrics.total_released, 1);
        assert_eq!(metrics.peak_pending, 2);
    }
}
