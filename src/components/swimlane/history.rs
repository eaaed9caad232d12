use std::collections::VecDeque;

use super::geometry::Point;
use super::state::ViewTransform;
use super::types::NodeKey;

/// One undoable change.
#[derive(Clone, Debug, PartialEq)]
pub enum Edit {
	/// Pan or zoom. `coalesce` marks steps of a continuous gesture (wheel)
	/// that fold into the previous step.
	Viewport {
		before: ViewTransform,
		after: ViewTransform,
		coalesce: bool,
	},
	/// A node dragged from `before` to `after` (top-left corners), possibly
	/// into another lane.
	MoveNode {
		key: NodeKey,
		before: Point,
		after: Point,
		lane_before: Option<NodeKey>,
		lane_after: Option<NodeKey>,
	},
}

/// Linear undo/redo stack.
#[derive(Clone, Debug)]
pub struct UndoHistory {
	undo: VecDeque<Edit>,
	redo: Vec<Edit>,
	limit: usize,
	sealed: bool,
}

impl UndoHistory {
	pub fn new(limit: usize) -> Self {
		Self {
			undo: VecDeque::new(),
			redo: Vec::new(),
			limit: limit.max(1),
			sealed: true,
		}
	}

	/// Records `edit`, discarding anything that could have been redone.
	pub fn record(&mut self, edit: Edit) {
		self.redo.clear();
		if let Edit::Viewport {
			after,
			coalesce: true,
			..
		} = &edit
		{
			if !self.sealed {
				if let Some(Edit::Viewport {
					after: top_after,
					coalesce: true,
					..
				}) = self.undo.back_mut()
				{
					*top_after = *after;
					return;
				}
			}
			self.sealed = false;
		} else {
			self.sealed = true;
		}
		self.undo.push_back(edit);
		while self.undo.len() > self.limit {
			self.undo.pop_front();
		}
	}

	/// Ends the current coalescing run so the next wheel step starts a new edit.
	pub fn seal(&mut self) {
		self.sealed = true;
	}

	pub fn undo(&mut self) -> Option<Edit> {
		self.sealed = true;
		let edit = self.undo.pop_back()?;
		self.redo.push(edit.clone());
		Some(edit)
	}

	pub fn redo(&mut self) -> Option<Edit> {
		self.sealed = true;
		let edit = self.redo.pop()?;
		self.undo.push_back(edit.clone());
		Some(edit)
	}

	pub fn can_undo(&self) -> bool {
		!self.undo.is_empty()
	}

	pub fn can_redo(&self) -> bool {
		!self.redo.is_empty()
	}

	pub fn clear(&mut self) {
		self.undo.clear();
		self.redo.clear();
		self.sealed = true;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn view(k: f64) -> ViewTransform {
		ViewTransform { x: 0.0, y: 0.0, k }
	}

	fn zoom(before: f64, after: f64, coalesce: bool) -> Edit {
		Edit::Viewport {
			before: view(before),
			after: view(after),
			coalesce,
		}
	}

	#[test]
	fn undo_then_redo_walks_the_stack() {
		let mut history = UndoHistory::new(10);
		history.record(zoom(1.0, 1.05, false));
		history.record(zoom(1.05, 1.1025, false));
		assert_eq!(history.undo(), Some(zoom(1.05, 1.1025, false)));
		assert!(history.can_redo());
		assert_eq!(history.redo(), Some(zoom(1.05, 1.1025, false)));
		assert!(!history.can_redo());
	}

	#[test]
	fn new_edit_clears_redo() {
		let mut history = UndoHistory::new(10);
		history.record(zoom(1.0, 2.0, false));
		history.undo();
		history.record(zoom(1.0, 0.5, false));
		assert!(!history.can_redo());
		assert_eq!(history.undo(), Some(zoom(1.0, 0.5, false)));
		assert!(!history.can_undo());
	}

	#[test]
	fn wheel_steps_coalesce_until_sealed() {
		let mut history = UndoHistory::new(10);
		history.record(zoom(1.0, 1.1, true));
		history.record(zoom(1.1, 1.2, true));
		history.record(zoom(1.2, 1.3, true));
		history.seal();
		history.record(zoom(1.3, 1.4, true));
		assert_eq!(history.undo(), Some(zoom(1.3, 1.4, true)));
		assert_eq!(history.undo(), Some(zoom(1.0, 1.3, true)));
		assert!(!history.can_undo());
	}

	#[test]
	fn limit_drops_oldest() {
		let mut history = UndoHistory::new(2);
		for k in 1..=3 {
			history.record(zoom(k as f64, k as f64 + 1.0, false));
		}
		assert_eq!(history.undo(), Some(zoom(3.0, 4.0, false)));
		assert_eq!(history.undo(), Some(zoom(2.0, 3.0, false)));
		assert_eq!(history.undo(), None);
	}
}
