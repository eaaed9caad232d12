use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

use super::config::DiagramConfig;
use super::controller::{DiagramCallbacks, DiagramController, HistoryState};
use super::geometry::Point;
use super::layout::LaneHeights;
use super::render;
use super::state::{Selection, Viewport};
use super::types::{NodeKey, WorkflowData};

/// Copyable handle to a page-owned [`DiagramController`].
///
/// The controller lives in the reactive owner of whoever created the
/// handle; once that owner is disposed every call becomes a no-op.
#[derive(Clone, Copy)]
pub struct DiagramHandle(StoredValue<DiagramController, LocalStorage>);

impl DiagramHandle {
	pub fn with_lane_heights(config: DiagramConfig, heights: LaneHeights) -> Self {
		Self(StoredValue::new_local(DiagramController::new(config).with_lane_heights(heights)))
	}

	/// Runs `f` against the controller, or returns `None` once it is gone.
	pub fn with<R>(&self, f: impl FnOnce(&mut DiagramController) -> R) -> Option<R> {
		self.0.try_update_value(f)
	}

	pub fn undo(&self) {
		self.with(DiagramController::undo);
	}

	pub fn redo(&self) {
		self.with(DiagramController::redo);
	}

	pub fn clear_selection(&self) {
		self.with(DiagramController::clear_selection);
	}

	pub fn set_highlighted_nodes(&self, keys: &[NodeKey]) {
		self.with(|c| c.set_highlighted_nodes(keys));
	}

	pub fn teardown(&self) {
		self.with(DiagramController::teardown);
	}
}

fn canvas_size(canvas: &HtmlCanvasElement, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_width() as f64)
				.filter(|w| *w > 0.0)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.filter(|h| *h > 0.0)
				.unwrap_or(600.0)
		}),
	)
}

fn viewport_of(canvas: &HtmlCanvasElement) -> Viewport {
	let rect = canvas.get_bounding_client_rect();
	Viewport {
		origin: Point::new(rect.left(), rect.top()),
		width: canvas.width() as f64,
		height: canvas.height() as f64,
	}
}

/// Canvas-relative pointer position.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Keeps the controller's viewport in step with where the canvas sits now.
fn sync_viewport(handle: DiagramHandle, canvas_ref: NodeRef<leptos::html::Canvas>) {
	let Some(canvas) = canvas_ref.get() else {
		return;
	};
	let viewport = viewport_of(&canvas.into());
	handle.with(|c| {
		if c.state().is_some_and(|s| s.viewport != viewport) {
			c.resize(viewport);
		}
	});
}

/// Window-level hooks one canvas installs: the resize listener and the
/// animation frame loop, whose closure holds itself to request the next frame.
struct CanvasHooks<C = Closure<dyn FnMut()>> {
	started: bool,
	resize: Option<C>,
	frame: Rc<RefCell<Option<C>>>,
	/// Frame requested but not yet run.
	frame_id: Rc<Cell<Option<i32>>>,
}

impl<C> Default for CanvasHooks<C> {
	fn default() -> Self {
		Self {
			started: false,
			resize: None,
			frame: Rc::new(RefCell::new(None)),
			frame_id: Rc::new(Cell::new(None)),
		}
	}
}

impl<C> CanvasHooks<C> {
	/// Drops the frame closure, breaking its self-reference, and hands back
	/// the resize listener and any pending frame for the caller to detach.
	fn release(&mut self) -> (Option<C>, Option<i32>) {
		let frame = self.frame.borrow_mut().take();
		drop(frame);
		(self.resize.take(), self.frame_id.take())
	}
}

impl CanvasHooks {
	fn detach(&mut self) {
		let (resize, pending) = self.release();
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(id) = pending {
			if let Err(err) = window.cancel_animation_frame(id) {
				error!("could not cancel animation frame: {err:?}");
			}
		}
		if let Some(cb) = resize {
			if let Err(err) = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref()) {
				error!("could not remove resize listener: {err:?}");
			}
		}
	}
}

/// Interactive swimlane diagram drawn on a 2D canvas.
///
/// Rebuilds the diagram whenever `data` changes. Changes to `highlighted`
/// only recolor nodes.
#[component]
pub fn SwimlaneCanvas(
	#[prop(into)] data: Signal<WorkflowData>,
	#[prop(into)] highlighted: Signal<Vec<NodeKey>>,
	handle: DiagramHandle,
	#[prop(optional, into)] on_select: Option<Callback<Selection>>,
	#[prop(optional, into)] on_zoom: Option<Callback<u32>>,
	#[prop(optional, into)] on_history: Option<Callback<HistoryState>>,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let hooks = StoredValue::new_local(CanvasHooks::<Closure<dyn FnMut()>>::default());

	Effect::new(move |_| {
		let workflow = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("no window; diagram not mounted");
			return;
		};

		let (w, h) = canvas_size(&canvas, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let callbacks = DiagramCallbacks {
			on_zoom: on_zoom.map(|cb| Box::new(move |pct| cb.run(pct)) as Box<dyn Fn(u32)>),
			on_select: on_select.map(|cb| Box::new(move |s: &Selection| cb.run(s.clone())) as Box<dyn Fn(&Selection)>),
			on_history: on_history.map(|cb| Box::new(move |st| cb.run(st)) as Box<dyn Fn(HistoryState)>),
		};
		let keys = highlighted.get_untracked();
		handle.with(|c| c.mount(&workflow, &keys, viewport_of(&canvas), callbacks));

		let first = hooks
			.try_update_value(|h| !std::mem::replace(&mut h.started, true))
			.unwrap_or(false);
		if !first {
			return;
		}

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => {
					error!("2d context has an unexpected type");
					return;
				}
			},
			_ => {
				error!("canvas has no 2d context");
				return;
			}
		};

		let canvas_resize = canvas.clone();
		let resize = Closure::<dyn FnMut()>::new(move || {
			let (nw, nh) = canvas_size(&canvas_resize, width, height);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			let viewport = viewport_of(&canvas_resize);
			handle.with(|c| c.resize(viewport));
		});
		let Some((frame, frame_id)) = hooks.try_update_value(|h| {
			if let Err(err) = window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref()) {
				error!("could not add resize listener: {err:?}");
			}
			h.resize = Some(resize);
			(h.frame.clone(), h.frame_id.clone())
		}) else {
			return;
		};

		let frame_inner = frame.clone();
		let id_inner = frame_id.clone();
		*frame.borrow_mut() = Some(Closure::new(move || {
			id_inner.set(None);
			let alive = handle
				.with(|c| {
					if c.take_dirty() {
						if let Some(s) = c.state() {
							render::render(s, &ctx);
						}
					}
				})
				.is_some();
			if !alive {
				debug!("diagram owner disposed; stopping render loop");
				return;
			}
			if let (Some(cb), Some(win)) = (&*frame_inner.borrow(), web_sys::window()) {
				id_inner.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *frame.borrow() {
			frame_id.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	});

	Effect::new(move |_| {
		let keys = highlighted.get();
		handle.set_highlighted_nodes(&keys);
	});

	on_cleanup(move || {
		hooks.try_update_value(CanvasHooks::detach);
		handle.teardown();
	});

	let on_mousedown = move |ev: MouseEvent| {
		sync_viewport(handle, canvas_ref);
		if let Some(p) = local_point(canvas_ref, &ev) {
			handle.with(|c| c.pointer_down(p));
		}
	};

	let on_mousemove = move |ev: MouseEvent| {
		if let Some(p) = local_point(canvas_ref, &ev) {
			handle.with(|c| c.pointer_move(p));
		}
	};

	let on_mouseup = move |ev: MouseEvent| {
		if let Some(p) = local_point(canvas_ref, &ev) {
			handle.with(|c| c.pointer_up(p));
		}
	};

	let on_mouseleave = move |_: MouseEvent| {
		handle.with(DiagramController::pointer_leave);
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(p) = local_point(canvas_ref, &ev) {
			let delta = ev.delta_y();
			handle.with(|c| c.wheel(p, delta));
		}
	};

	let on_keydown = move |ev: KeyboardEvent| {
		if !(ev.ctrl_key() || ev.meta_key()) {
			return;
		}
		match (ev.key().as_str(), ev.shift_key()) {
			("z" | "Z", false) => handle.undo(),
			("z" | "Z", true) | ("y" | "Y", _) => handle.redo(),
			_ => return,
		}
		ev.prevent_default();
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="swimlane-canvas"
			tabindex="0"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:keydown=on_keydown
			style="display: block; cursor: grab; outline: none;"
		/>
	}
}
